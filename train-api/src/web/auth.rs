//! Token authentication for every request.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use super::routes::AppError;
use super::state::AppState;

pub const AUTHORIZATION_SCHEME: &str = "Token";

/// Reject requests without `Authorization: Token <token>`.
pub async fn require_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| {
            AppError::InvalidAuthorizationHeader("Missing Authorization HTTP request header".into())
        })?
        .to_str()
        .map_err(|_| {
            AppError::InvalidAuthorizationHeader("Authorization header is not valid text".into())
        })?;

    let (scheme, token) = header.split_once(' ').unwrap_or((header, ""));
    if scheme != AUTHORIZATION_SCHEME {
        return Err(AppError::InvalidAuthorizationHeader(format!(
            "Expected Authorization HTTP request header scheme to be '{AUTHORIZATION_SCHEME}'"
        )));
    }

    if token.trim() != &*state.authorization_token {
        return Err(AppError::BadAuthorization);
    }

    Ok(next.run(request).await)
}
