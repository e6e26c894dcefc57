//! services/api/src/web/ai.rs
//!
//! Handlers for the AI assistant: daily summaries, chat and predictions.
//! Model failures never surface here; the core answers with fallback text.

use crate::web::{rest::port_error_response, state::AppState};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::NaiveDate;
use health_log_core::domain::ChatMessage;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const DEFAULT_PREDICTION_DAYS: u32 = 30;

#[derive(Deserialize, Default, ToSchema)]
pub struct DailySummaryRequest {
    /// Day to summarize; defaults to today.
    #[serde(default)]
    date: Option<NaiveDate>,
}

#[derive(Deserialize, ToSchema)]
pub struct ChatRequest {
    message: String,
    /// Earlier turns of the conversation, oldest first.
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    history: Vec<ChatMessage>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PredictionQuery {
    /// Size of the look-back window in days (default 30).
    days: Option<u32>,
}

/// Summarize a day's log with the AI assistant and cache the result on it.
#[utoipa::path(
    post,
    path = "/api/ai/daily-summary",
    request_body = DailySummaryRequest,
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    responses(
        (status = 200, description = "Summary, recommendations, health score and trends"),
        (status = 404, description = "No health data for the requested day")
    )
)]
pub async fn daily_summary_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(request): Json<DailySummaryRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let summary = app_state
        .service
        .daily_summary(user_id, request.date)
        .await
        .map_err(port_error_response)?;
    info!(%user_id, recommendations = summary.recommendations.len(), "daily summary generated");
    Ok(Json(summary))
}

/// Ask the AI assistant a question, grounded in the user's profile and latest log.
#[utoipa::path(
    post,
    path = "/api/ai/chat",
    request_body = ChatRequest,
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    responses(
        (status = 200, description = "The assistant's reply and a timestamp"),
        (status = 400, description = "Empty message")
    )
)]
pub async fn chat_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let reply = app_state
        .service
        .chat(user_id, &request.message, &request.history)
        .await
        .map_err(port_error_response)?;
    Ok(Json(reply))
}

/// Rule-based outlook for sleep and activity.
#[utoipa::path(
    get,
    path = "/api/ai/predictions",
    params(
        PredictionQuery,
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    ),
    responses((status = 200, description = "Predictions, or a note that more data is needed"))
)]
pub async fn predictions_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(query): Query<PredictionQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let report = app_state
        .service
        .predictions(user_id, query.days.unwrap_or(DEFAULT_PREDICTION_DAYS))
        .await
        .map_err(port_error_response)?;
    Ok(Json(report))
}
