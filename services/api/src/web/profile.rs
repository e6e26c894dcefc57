//! services/api/src/web/profile.rs
//!
//! Handlers for reading and editing the caller's health profile.

use crate::web::{rest::port_error_response, state::AppState};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use health_log_core::domain::ProfileUpdate;
use std::sync::Arc;
use uuid::Uuid;

/// The caller's profile, created empty on first access.
#[utoipa::path(
    get,
    path = "/api/profile",
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    responses((status = 200, description = "The user's profile"))
)]
pub async fn get_profile_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let profile = app_state
        .service
        .profile(user_id)
        .await
        .map_err(port_error_response)?;
    Ok(Json(profile))
}

/// Update any subset of age, gender, height, weight, activity level and goals.
#[utoipa::path(
    put,
    path = "/api/profile",
    request_body(content_type = "application/json", description = "Profile fields to change."),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    responses(
        (status = 200, description = "The updated profile"),
        (status = 400, description = "A field is out of range")
    )
)]
pub async fn update_profile_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(update): Json<ProfileUpdate>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let profile = app_state
        .service
        .update_profile(user_id, update)
        .await
        .map_err(port_error_response)?;
    Ok(Json(profile))
}
