//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the health-log REST endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{ai, profile, state::AppState};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::NaiveDate;
use health_log_core::domain::{DailyLog, DailyLogUpdate, NewActivity, NewMeal};
use health_log_core::ports::PortError;
use health_log_core::service::LogQuery;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        upsert_log_handler,
        list_logs_handler,
        today_handler,
        add_meal_handler,
        add_activity_handler,
        analytics_handler,
        calorie_balance_handler,
        scores_handler,
        ai::daily_summary_handler,
        ai::chat_handler,
        ai::predictions_handler,
        profile::get_profile_handler,
        profile::update_profile_handler,
    ),
    components(
        schemas(
            LogResponse,
            MealResponse,
            AddMealRequest,
            AddActivityRequest,
            ai::DailySummaryRequest,
            ai::ChatRequest
        )
    ),
    tags(
        (
            name = "HealthMate API",
            description = "Daily health logging, analytics and the AI assistant."
        )
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Maps a core error onto the status code and message sent to the client.
pub fn port_error_response(e: PortError) -> (StatusCode, String) {
    match e {
        PortError::Validation { field, message } => {
            (StatusCode::BAD_REQUEST, format!("{}: {}", field, message))
        }
        PortError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        PortError::Conflict(message) => (StatusCode::CONFLICT, message),
        other => {
            error!("Request failed: {:?}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

//=========================================================================================
// API Payload and Query Structs
//=========================================================================================

/// Returned after a write to a daily log.
#[derive(Serialize, ToSchema)]
pub struct LogResponse {
    message: String,
    #[schema(value_type = Object)]
    log: DailyLog,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MealResponse {
    message: String,
    #[schema(value_type = Object)]
    log: DailyLog,
    total_calories: u32,
}

#[derive(Deserialize, ToSchema)]
pub struct AddMealRequest {
    #[schema(value_type = Object)]
    meal: NewMeal,
}

#[derive(Deserialize, ToSchema)]
pub struct AddActivityRequest {
    #[schema(value_type = Object)]
    activity: NewActivity,
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LogsQuery {
    /// First day of the range, inclusive. Ignored unless `endDate` is also given.
    start_date: Option<NaiveDate>,
    /// Last day of the range, inclusive.
    end_date: Option<NaiveDate>,
    /// Maximum number of logs, newest first. Defaults to 30.
    limit: Option<usize>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DaysQuery {
    /// Size of the look-back window in days.
    days: Option<u32>,
}

const DEFAULT_REPORT_DAYS: u32 = 7;

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Merge a partial update into a day's log (today unless `date` is given).
#[utoipa::path(
    post,
    path = "/api/health/log",
    request_body(
        content_type = "application/json",
        description = "Any subset of the daily log sections; `date` is YYYY-MM-DD or RFC 3339."
    ),
    responses(
        (status = 200, description = "Log updated", body = LogResponse),
        (status = 400, description = "A field is out of range"),
        (status = 401, description = "Missing or invalid x-user-id header")
    ),
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user."))
)]
pub async fn upsert_log_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(update): Json<DailyLogUpdate>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let log = app_state
        .service
        .merge_update(user_id, update)
        .await
        .map_err(port_error_response)?;
    Ok(Json(LogResponse {
        message: "Health log updated successfully".to_string(),
        log,
    }))
}

/// List logs, newest first.
#[utoipa::path(
    get,
    path = "/api/health/logs",
    params(LogsQuery, ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    responses(
        (status = 200, description = "Logs, newest first"),
        (status = 401, description = "Missing or invalid x-user-id header")
    )
)]
pub async fn list_logs_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(query): Query<LogsQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let logs = app_state
        .service
        .list_logs(
            user_id,
            LogQuery {
                start: query.start_date,
                end: query.end_date,
                limit: query.limit,
            },
        )
        .await
        .map_err(port_error_response)?;
    Ok(Json(logs))
}

/// Today's log, created empty on first access.
#[utoipa::path(
    get,
    path = "/api/health/today",
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    responses((status = 200, description = "Today's log"))
)]
pub async fn today_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let log = app_state
        .service
        .today_log(user_id)
        .await
        .map_err(port_error_response)?;
    Ok(Json(log))
}

/// Append a meal to today's log.
#[utoipa::path(
    post,
    path = "/api/health/meal",
    request_body = AddMealRequest,
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    responses(
        (status = 200, description = "Meal added", body = MealResponse),
        (status = 400, description = "Negative calories or protein")
    )
)]
pub async fn add_meal_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(request): Json<AddMealRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let log = app_state
        .service
        .add_meal(user_id, request.meal)
        .await
        .map_err(port_error_response)?;
    let total_calories = log.diet.total_calories;
    Ok(Json(MealResponse {
        message: "Meal added successfully".to_string(),
        log,
        total_calories,
    }))
}

/// Append an exercise activity to today's log.
#[utoipa::path(
    post,
    path = "/api/health/activity",
    request_body = AddActivityRequest,
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    responses(
        (status = 200, description = "Activity added", body = LogResponse),
        (status = 400, description = "Duration outside one minute to one day")
    )
)]
pub async fn add_activity_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(request): Json<AddActivityRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let log = app_state
        .service
        .add_activity(user_id, request.activity)
        .await
        .map_err(port_error_response)?;
    Ok(Json(LogResponse {
        message: "Activity added successfully".to_string(),
        log,
    }))
}

/// Averages and trend series over the last `days` days (default 7).
#[utoipa::path(
    get,
    path = "/api/health/analytics",
    params(DaysQuery, ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    responses((status = 200, description = "Analytics report"))
)]
pub async fn analytics_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(query): Query<DaysQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let report = app_state
        .service
        .analytics(user_id, query.days.unwrap_or(DEFAULT_REPORT_DAYS))
        .await
        .map_err(port_error_response)?;
    Ok(Json(report))
}

/// Calorie intake against step burn over the last `days` days (default 7).
#[utoipa::path(
    get,
    path = "/api/health/calorie-balance",
    params(DaysQuery, ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    responses((status = 200, description = "Calorie balance report"))
)]
pub async fn calorie_balance_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(query): Query<DaysQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let report = app_state
        .service
        .calorie_balance(user_id, query.days.unwrap_or(DEFAULT_REPORT_DAYS))
        .await
        .map_err(port_error_response)?;
    Ok(Json(report))
}

/// Health scores for today, with the blood pressure reading explained.
#[utoipa::path(
    get,
    path = "/api/health/scores",
    params(("x-user-id" = Uuid, Header, description = "The unique ID of the user.")),
    responses((status = 200, description = "Summary and dashboard scores"))
)]
pub async fn scores_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let scores = app_state
        .service
        .health_scores(user_id)
        .await
        .map_err(port_error_response)?;
    Ok(Json(scores))
}
