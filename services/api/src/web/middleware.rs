//! services/api/src/web/middleware.rs
//!
//! Identity middleware for protecting routes.

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use tracing::debug;
use uuid::Uuid;

/// Header carrying the authenticated user's id, set by the upstream auth layer.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Middleware that reads the caller's id from the `x-user-id` header.
///
/// If valid, inserts the user_id into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_user(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let user_id = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .ok_or_else(|| {
            debug!("Rejecting request without a valid {} header", USER_ID_HEADER);
            StatusCode::UNAUTHORIZED
        })?;

    req.extensions_mut().insert(user_id);
    Ok(next.run(req).await)
}
