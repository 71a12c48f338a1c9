//! Document metadata endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppContainer;
use crate::domain::entities::{CurrentUser, Document, DocumentType};
use crate::services::{DownloadLink, UploadDocument};
use crate::shared::{AppError, AppResult};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UploadDocumentRequest {
    pub case_id: Uuid,
    #[validate(length(min = 1))]
    pub original_name: String,
    #[validate(length(min = 1))]
    pub mime_type: String,
    pub size_bytes: i64,
    pub document_type: Option<DocumentType>,
}

pub async fn upload(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<UploadDocumentRequest>,
) -> AppResult<(StatusCode, Json<Document>)> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let document = container
        .document_service
        .upload(
            &current,
            UploadDocument {
                case_id: payload.case_id,
                original_name: payload.original_name,
                mime_type: payload.mime_type,
                size_bytes: payload.size_bytes,
                document_type: payload.document_type,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(document)))
}

pub async fn list_for_case(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Path(case_id): Path<Uuid>,
) -> AppResult<Json<Vec<Document>>> {
    Ok(Json(
        container
            .document_service
            .list_for_case(&current, case_id)
            .await?,
    ))
}

pub async fn find_one(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Document>> {
    Ok(Json(
        container.document_service.find_one(&current, id).await?,
    ))
}

pub async fn download(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DownloadLink>> {
    Ok(Json(
        container.document_service.download(&current, id).await?,
    ))
}

pub async fn delete(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    container.document_service.delete(&current, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
