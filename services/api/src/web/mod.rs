pub mod ai;
pub mod middleware;
pub mod profile;
pub mod rest;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub use middleware::require_user;
use state::AppState;

/// All API routes. Every route requires the `x-user-id` header.
pub fn api_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health/log", post(rest::upsert_log_handler))
        .route("/api/health/logs", get(rest::list_logs_handler))
        .route("/api/health/today", get(rest::today_handler))
        .route("/api/health/meal", post(rest::add_meal_handler))
        .route("/api/health/activity", post(rest::add_activity_handler))
        .route("/api/health/analytics", get(rest::analytics_handler))
        .route("/api/health/calorie-balance", get(rest::calorie_balance_handler))
        .route("/api/health/scores", get(rest::scores_handler))
        .route("/api/ai/daily-summary", post(ai::daily_summary_handler))
        .route("/api/ai/chat", post(ai::chat_handler))
        .route("/api/ai/predictions", get(ai::predictions_handler))
        .route(
            "/api/profile",
            get(profile::get_profile_handler).put(profile::update_profile_handler),
        )
        .layer(axum_middleware::from_fn(require_user))
        .with_state(app_state)
}
