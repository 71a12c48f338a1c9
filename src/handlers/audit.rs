//! Audit browse and export endpoints. Role gates live in the service.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppContainer;
use crate::domain::entities::{AuditAction, AuditEntry, CurrentUser};
use crate::domain::repositories::AuditQuery;
use crate::shared::{AppResult, PageParams, Paginated};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQueryParams {
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub user_id: Option<Uuid>,
    pub case_id: Option<Uuid>,
    pub action: Option<AuditAction>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ActivityParams {
    pub limit: Option<i64>,
}

const DEFAULT_ACTIVITY_LIMIT: i64 = 50;

pub async fn query(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<AuditQueryParams>,
) -> AppResult<Json<Paginated<AuditEntry>>> {
    let page = PageParams {
        page: params.page,
        limit: params.limit,
    };
    let query = AuditQuery {
        entity_type: params.entity_type,
        entity_id: params.entity_id,
        user_id: params.user_id,
        case_id: params.case_id,
        action: params.action,
        start_date: params.start_date,
        end_date: params.end_date,
        ..Default::default()
    };
    Ok(Json(
        container.audit_service.query(&current, query, &page).await?,
    ))
}

pub async fn for_case(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<AuditEntry>>> {
    Ok(Json(container.audit_service.for_case(&current, id).await?))
}

pub async fn for_user(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Query(params): Query<ActivityParams>,
) -> AppResult<Json<Vec<AuditEntry>>> {
    let limit = params.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT).clamp(1, 500);
    Ok(Json(
        container
            .audit_service
            .for_user(&current, id, limit)
            .await?,
    ))
}

pub async fn my_activity(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<ActivityParams>,
) -> AppResult<Json<Vec<AuditEntry>>> {
    let limit = params.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT).clamp(1, 500);
    Ok(Json(
        container.audit_service.my_activity(&current, limit).await?,
    ))
}

pub async fn export(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Path((entity_type, entity_id)): Path<(String, String)>,
) -> AppResult<Json<Vec<AuditEntry>>> {
    Ok(Json(
        container
            .audit_service
            .export_for_entity(&current, &entity_type, &entity_id)
            .await?,
    ))
}
