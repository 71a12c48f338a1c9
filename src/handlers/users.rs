//! Clinic user management endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppContainer;
use crate::domain::entities::{CurrentUser, Role, User};
use crate::services::{CreateUser, UpdateUser};
use crate::shared::{AppError, AppResult};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: Option<String>,
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub new_password: String,
}

pub async fn create(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let user = container
        .user_service
        .create(
            &current,
            CreateUser {
                email: payload.email,
                password: payload.password,
                first_name: payload.first_name,
                last_name: payload.last_name,
                role: payload.role,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(container.user_service.list(&current).await?))
}

pub async fn find_one(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<User>> {
    Ok(Json(container.user_service.find_one(&current, id).await?))
}

pub async fn update(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<User>> {
    let user = container
        .user_service
        .update(
            &current,
            id,
            UpdateUser {
                first_name: payload.first_name,
                last_name: payload.last_name,
                role: payload.role,
                is_active: payload.is_active,
            },
        )
        .await?;
    Ok(Json(user))
}

pub async fn deactivate(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    container.user_service.deactivate(&current, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn change_password(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    container
        .user_service
        .change_password(
            &current,
            id,
            payload.current_password.as_deref(),
            &payload.new_password,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
