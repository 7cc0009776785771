//! Integration tests for the health check, degraded mode and documentation routes.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, connected_state, get, post_json};
use scoreboard_back::{config::AppConfig, state::AppState};
use serde_json::json;

#[tokio::test]
async fn healthcheck_reports_ok_when_connected() {
    let app = build_test_app(connected_state().await);
    let response = get(app, "/healthcheck").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn degraded_mode_answers_service_unavailable() {
    let app = build_test_app(AppState::new(AppConfig::default()));

    let health = body_json(get(app.clone(), "/healthcheck").await).await;
    assert_eq!(health["status"], "degraded");

    let response = get(app.clone(), "/api/v1/games").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = post_json(
        app,
        "/api/v1/games",
        json!({ "name": "Yahtzee", "players": ["Alice"] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(body_json(response).await["message"].is_string());
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = build_test_app(connected_state().await);
    let response = get(app, "/api-doc/openapi.json").await;

    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    assert!(doc["paths"]["/api/v1/games/{id}"].is_object());
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = build_test_app(connected_state().await);
    assert_eq!(get(app, "/nope").await.status(), StatusCode::NOT_FOUND);
}
