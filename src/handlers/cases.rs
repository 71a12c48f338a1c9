//! Case workflow endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppContainer;
use crate::domain::entities::{
    Case, CaseNote, CasePriority, CaseSource, CaseStatus, CaseStatusHistory, CurrentUser,
};
use crate::domain::repositories::{CaseListQuery, CaseSortField, SortOrder};
use crate::services::{CaseStats, CreateCase, UpdateCase};
use crate::shared::{AppError, AppResult, PageParams, Paginated};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCaseRequest {
    #[validate(length(min = 1))]
    pub patient_first_name: String,
    #[validate(length(min = 1))]
    pub patient_last_name: String,
    pub patient_dob: NaiveDate,
    pub patient_nhs_number: Option<String>,
    #[validate(email)]
    pub patient_email: Option<String>,
    pub patient_phone: Option<String>,
    #[validate(length(min = 1))]
    pub referral_type: String,
    #[validate(length(min = 1))]
    pub referring_clinician: String,
    pub clinical_notes: Option<String>,
    pub insurer_id: Uuid,
    pub insurer_policy_number: Option<String>,
    pub priority: Option<CasePriority>,
    pub source_type: Option<CaseSource>,
    pub assigned_to_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCaseRequest {
    pub patient_first_name: Option<String>,
    pub patient_last_name: Option<String>,
    pub patient_dob: Option<NaiveDate>,
    pub patient_nhs_number: Option<String>,
    pub patient_email: Option<String>,
    pub patient_phone: Option<String>,
    pub referral_type: Option<String>,
    pub referring_clinician: Option<String>,
    pub clinical_notes: Option<String>,
    pub insurer_id: Option<Uuid>,
    pub insurer_policy_number: Option<String>,
    pub insurer_auth_code: Option<String>,
    pub priority: Option<CasePriority>,
    pub assigned_to_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: CaseStatus,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub assigned_to_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddNoteRequest {
    #[validate(length(min = 1))]
    pub content: String,
    #[serde(default)]
    pub is_internal: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCasesParams {
    pub status: Option<CaseStatus>,
    pub priority: Option<CasePriority>,
    pub assigned_to_id: Option<Uuid>,
    pub insurer_id: Option<Uuid>,
    pub search: Option<String>,
    pub sla_breached: Option<bool>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaCheckResponse {
    pub newly_breached: u64,
}

pub async fn create(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateCaseRequest>,
) -> AppResult<(StatusCode, Json<Case>)> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let case = container
        .case_service
        .create(
            &current,
            CreateCase {
                patient_first_name: payload.patient_first_name,
                patient_last_name: payload.patient_last_name,
                patient_dob: payload.patient_dob,
                patient_nhs_number: payload.patient_nhs_number,
                patient_email: payload.patient_email,
                patient_phone: payload.patient_phone,
                referral_type: payload.referral_type,
                referring_clinician: payload.referring_clinician,
                clinical_notes: payload.clinical_notes,
                insurer_id: payload.insurer_id,
                insurer_policy_number: payload.insurer_policy_number,
                priority: payload.priority,
                source_type: payload.source_type,
                assigned_to_id: payload.assigned_to_id,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(case)))
}

pub async fn list(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<ListCasesParams>,
) -> AppResult<Json<Paginated<Case>>> {
    let page = PageParams {
        page: params.page,
        limit: params.limit,
    };
    let query = CaseListQuery {
        status: params.status,
        priority: params.priority,
        assigned_to_id: params.assigned_to_id,
        insurer_id: params.insurer_id,
        search: params.search,
        sla_breached: params.sla_breached,
        sort_by: parse_sort_field(params.sort_by.as_deref())?,
        sort_order: parse_sort_order(params.sort_order.as_deref())?,
        ..Default::default()
    };
    let result = container.case_service.list(&current, query, &page).await?;
    Ok(Json(result))
}

pub async fn stats(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<Json<CaseStats>> {
    Ok(Json(container.case_service.stats(&current).await?))
}

pub async fn overdue(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Case>>> {
    Ok(Json(container.case_service.overdue(&current).await?))
}

pub async fn find_one(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Case>> {
    Ok(Json(container.case_service.find_one(&current, id).await?))
}

pub async fn find_by_reference(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Path(reference): Path<String>,
) -> AppResult<Json<Case>> {
    Ok(Json(
        container
            .case_service
            .find_by_reference(&current, &reference)
            .await?,
    ))
}

pub async fn update(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCaseRequest>,
) -> AppResult<Json<Case>> {
    let case = container
        .case_service
        .update(
            &current,
            id,
            UpdateCase {
                patient_first_name: payload.patient_first_name,
                patient_last_name: payload.patient_last_name,
                patient_dob: payload.patient_dob,
                patient_nhs_number: payload.patient_nhs_number,
                patient_email: payload.patient_email,
                patient_phone: payload.patient_phone,
                referral_type: payload.referral_type,
                referring_clinician: payload.referring_clinician,
                clinical_notes: payload.clinical_notes,
                insurer_id: payload.insurer_id,
                insurer_policy_number: payload.insurer_policy_number,
                insurer_auth_code: payload.insurer_auth_code,
                priority: payload.priority,
                assigned_to_id: payload.assigned_to_id,
            },
        )
        .await?;
    Ok(Json(case))
}

pub async fn update_status(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<Case>> {
    let case = container
        .case_service
        .update_status(&current, id, payload.status, payload.reason)
        .await?;
    Ok(Json(case))
}

pub async fn assign(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignRequest>,
) -> AppResult<Json<Case>> {
    let case = container
        .case_service
        .assign(&current, id, payload.assigned_to_id)
        .await?;
    Ok(Json(case))
}

pub async fn add_note(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddNoteRequest>,
) -> AppResult<(StatusCode, Json<CaseNote>)> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let note = container
        .case_service
        .add_note(&current, id, payload.content, payload.is_internal)
        .await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn notes(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<CaseNote>>> {
    Ok(Json(container.case_service.notes(&current, id).await?))
}

pub async fn history(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<CaseStatusHistory>>> {
    Ok(Json(container.case_service.history(&current, id).await?))
}

pub async fn check_sla(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<Json<SlaCheckResponse>> {
    let newly_breached = container.case_service.check_sla_breaches(&current).await?;
    Ok(Json(SlaCheckResponse { newly_breached }))
}

fn parse_sort_field(raw: Option<&str>) -> AppResult<CaseSortField> {
    match raw {
        None => Ok(CaseSortField::default()),
        Some("createdAt") => Ok(CaseSortField::CreatedAt),
        Some("updatedAt") => Ok(CaseSortField::UpdatedAt),
        Some("slaDeadline") => Ok(CaseSortField::SlaDeadline),
        Some("referenceNumber") => Ok(CaseSortField::ReferenceNumber),
        Some("priority") => Ok(CaseSortField::Priority),
        Some(other) => Err(AppError::validation(format!("Unknown sort field: {other}"))),
    }
}

fn parse_sort_order(raw: Option<&str>) -> AppResult<SortOrder> {
    match raw {
        None => Ok(SortOrder::default()),
        Some("asc") => Ok(SortOrder::Asc),
        Some("desc") => Ok(SortOrder::Desc),
        Some(other) => Err(AppError::validation(format!("Unknown sort order: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_params_parse_and_default() {
        assert_eq!(parse_sort_field(None).unwrap(), CaseSortField::UpdatedAt);
        assert_eq!(
            parse_sort_field(Some("slaDeadline")).unwrap(),
            CaseSortField::SlaDeadline
        );
        assert!(parse_sort_field(Some("bogus")).is_err());
        assert_eq!(parse_sort_order(Some("asc")).unwrap(), SortOrder::Asc);
        assert!(parse_sort_order(Some("ascending")).is_err());
    }
}
