//! Authentication endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppContainer;
use crate::domain::entities::{CurrentUser, Role, User};
use crate::services::{LoginOutcome, NewUser};
use crate::shared::{AppError, AppResult};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Envelope shared by login and register.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    pub role: Option<Role>,
    pub clinic_id: Uuid,
}

pub async fn login(
    State(container): State<AppContainer>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let outcome = container
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;
    Ok(Json(auth_response(&container, outcome)))
}

pub async fn register(
    State(container): State<AppContainer>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let outcome = container
        .auth_service
        .register(NewUser {
            email: payload.email,
            password: payload.password,
            first_name: payload.first_name,
            last_name: payload.last_name,
            role: payload.role,
            clinic_id: payload.clinic_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(auth_response(&container, outcome))))
}

fn auth_response(container: &AppContainer, outcome: LoginOutcome) -> AuthResponse {
    AuthResponse {
        access_token: outcome.token,
        token_type: "Bearer",
        expires_in: container.token_service.ttl_seconds(),
        user: outcome.user,
    }
}

pub async fn me(
    State(container): State<AppContainer>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<Json<User>> {
    let user = container.auth_service.me(&current).await?;
    Ok(Json(user))
}
