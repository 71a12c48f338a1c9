//! Bearer-token authentication middleware. On success the verified
//! `CurrentUser` is attached as a request extension.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::app::AppContainer;
use crate::shared::AppError;

pub async fn require_auth(
    State(container): State<AppContainer>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::unauthorized("Expected bearer token"))?;

    let current = container.token_service.verify(token)?;
    request.extensions_mut().insert(current);
    Ok(next.run(request).await)
}
