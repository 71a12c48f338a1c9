//! Clinic reporting endpoints; all read-only.

use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::app::AppContainer;
use crate::domain::entities::CurrentUser;
use crate::services::report_service::{
    Dashboard, InsurerPerformance, SlaCompliance, UserProductivity, WeeklyTrendPoint,
};
use crate::shared::AppResult;

#[derive(Debug, Deserialize)]
pub struct WeeklyTrendParams {
    pub weeks: Option<u32>,
}

pub async fn dashboard(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<Json<Dashboard>> {
    Ok(Json(container.report_service.dashboard(&current).await?))
}

pub async fn weekly_trend(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<WeeklyTrendParams>,
) -> AppResult<Json<Vec<WeeklyTrendPoint>>> {
    Ok(Json(
        container
            .report_service
            .weekly_trend(&current, params.weeks)
            .await?,
    ))
}

pub async fn insurer_performance(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<Json<Vec<InsurerPerformance>>> {
    Ok(Json(
        container
            .report_service
            .insurer_performance(&current)
            .await?,
    ))
}

pub async fn sla_compliance(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<Json<SlaCompliance>> {
    Ok(Json(
        container.report_service.sla_compliance(&current).await?,
    ))
}

pub async fn user_productivity(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<Json<Vec<UserProductivity>>> {
    Ok(Json(
        container
            .report_service
            .user_productivity(&current)
            .await?,
    ))
}
