//! Drives the axum router in-process with stub ports.

use std::sync::Arc;

use api_lib::adapters::DisabledCompletionAdapter;
use api_lib::web::{api_router, rest::ApiDoc, state::AppState};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::NaiveDate;
use health_log_core::domain::{DailyLog, UserProfile};
use health_log_core::ports::{DatabaseService, DayMutation, PortError, PortResult};
use health_log_core::{service::HealthService, AdvisorSettings};
use http_body_util::BodyExt;
use tower::ServiceExt;
use utoipa::OpenApi;
use uuid::Uuid;

/// Knows every profile but holds no logs; writes fail.
struct EmptyStore;

#[async_trait]
impl DatabaseService for EmptyStore {
    async fn get_or_create_profile(&self, user_id: Uuid) -> PortResult<UserProfile> {
        Ok(UserProfile::new(user_id))
    }
    async fn save_profile(&self, profile: &UserProfile) -> PortResult<UserProfile> {
        Ok(profile.clone())
    }
    async fn find_log(&self, _user_id: Uuid, _day: NaiveDate) -> PortResult<Option<DailyLog>> {
        Ok(None)
    }
    async fn mutate_day(
        &self,
        _user_id: Uuid,
        _day: NaiveDate,
        _mutation: DayMutation,
    ) -> PortResult<DailyLog> {
        Err(PortError::Unexpected("connection reset".to_string()))
    }
    async fn logs_since(&self, _user_id: Uuid, _start: NaiveDate) -> PortResult<Vec<DailyLog>> {
        Ok(Vec::new())
    }
    async fn list_logs(
        &self,
        _user_id: Uuid,
        _range: Option<(NaiveDate, NaiveDate)>,
        _limit: usize,
    ) -> PortResult<Vec<DailyLog>> {
        Ok(Vec::new())
    }
    async fn latest_log(&self, _user_id: Uuid) -> PortResult<Option<DailyLog>> {
        Ok(None)
    }
    async fn clear_all_logs(&self) -> PortResult<u64> {
        Ok(0)
    }
}

fn app() -> axum::Router {
    let service = Arc::new(HealthService::new(
        Arc::new(EmptyStore),
        Arc::new(DisabledCompletionAdapter),
        AdvisorSettings::default(),
    ));
    api_router(Arc::new(AppState { service }))
}

fn request(
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn missing_or_malformed_user_header_is_unauthorized() {
    let response = app()
        .oneshot(request(Method::GET, "/api/health/today", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app()
        .oneshot(request(Method::GET, "/api/health/today", Some("not-a-uuid"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn out_of_range_update_is_a_bad_request() {
    let user = Uuid::new_v4().to_string();
    let body = serde_json::json!({"bloodPressure": {"systolic": 300, "diastolic": 80}});
    let response = app()
        .oneshot(request(Method::POST, "/api/health/log", Some(&user), Some(body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_with_a_plain_date_reaches_the_store() {
    let user = Uuid::new_v4().to_string();
    let body = serde_json::json!({"date": "2024-05-10", "energy": 6});
    let response = app()
        .oneshot(request(Method::POST, "/api/health/log", Some(&user), Some(body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = serde_json::json!({"date": "10/05/2024"});
    let response = app()
        .oneshot(request(Method::POST, "/api/health/log", Some(&user), Some(body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn day_long_activity_limit_is_a_bad_request() {
    let user = Uuid::new_v4().to_string();
    let body = serde_json::json!({"activity": {"type": "running", "duration": 1441}});
    let response = app()
        .oneshot(request(Method::POST, "/api/health/activity", Some(&user), Some(body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn largest_day_windows_are_served() {
    let user = Uuid::new_v4().to_string();
    for path in [
        "/api/health/analytics?days=4294967295",
        "/api/health/calorie-balance?days=4294967295",
        "/api/ai/predictions?days=4294967295",
    ] {
        let response = app()
            .oneshot(request(Method::GET, path, Some(&user), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
async fn summary_for_a_day_without_data_is_not_found() {
    let user = Uuid::new_v4().to_string();
    let body = serde_json::json!({"date": "2024-03-01"});
    let response = app()
        .oneshot(request(Method::POST, "/api/ai/daily-summary", Some(&user), Some(body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn store_failures_become_internal_errors() {
    let user = Uuid::new_v4().to_string();
    let response = app()
        .oneshot(request(Method::GET, "/api/health/today", Some(&user), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn chat_without_a_model_answers_with_fallback_text() {
    let user = Uuid::new_v4().to_string();
    let body = serde_json::json!({"message": "How much water should I drink?"});
    let response = app()
        .oneshot(request(Method::POST, "/api/ai/chat", Some(&user), Some(body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["response"].as_str().unwrap().starts_with("Sorry, the AI service"));
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn predictions_report_insufficient_data() {
    let user = Uuid::new_v4().to_string();
    let response = app()
        .oneshot(request(Method::GET, "/api/ai/predictions?days=14", Some(&user), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["sufficientData"], false);
    assert_eq!(json["predictions"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn profile_round_trip() {
    let user = Uuid::new_v4().to_string();
    let body = serde_json::json!({
        "age": 41,
        "activityLevel": "very_active",
        "healthGoals": ["better_sleep"],
    });
    let response = app()
        .oneshot(request(Method::PUT, "/api/profile", Some(&user), Some(body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["age"], 41);
    assert_eq!(json["activityLevel"], "very_active");
    assert_eq!(json["healthGoals"][0], "better_sleep");
}

#[test]
fn openapi_document_lists_every_route() {
    let doc = ApiDoc::openapi();
    for path in [
        "/api/health/log",
        "/api/health/logs",
        "/api/health/today",
        "/api/health/meal",
        "/api/health/activity",
        "/api/health/analytics",
        "/api/health/calorie-balance",
        "/api/health/scores",
        "/api/ai/daily-summary",
        "/api/ai/chat",
        "/api/ai/predictions",
        "/api/profile",
    ] {
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }
}
