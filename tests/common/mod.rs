//! Shared helpers for driving the router in integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, header::CONTENT_TYPE},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use scoreboard_back::{
    config::{AppConfig, DefaultDescription},
    dao::score_store::memory::MemoryScoreStore,
    routes,
    services::description_service,
    state::{AppState, SharedState},
};

/// State connected to an empty in-memory store.
pub async fn connected_state() -> SharedState {
    let state = AppState::new(AppConfig::default());
    state
        .install_score_store(Arc::new(MemoryScoreStore::new()))
        .await;
    state
}

/// State connected to an in-memory store seeded with `defaults`.
pub async fn seeded_state(defaults: Vec<DefaultDescription>) -> SharedState {
    let state = AppState::new(AppConfig::with_default_descriptions(defaults));
    let store: Arc<dyn scoreboard_back::dao::score_store::ScoreStore> =
        Arc::new(MemoryScoreStore::new());
    description_service::seed_default_descriptions(&store, state.config().default_descriptions())
        .await
        .expect("seeding the memory store");
    state.install_score_store(store).await;
    state
}

/// Build the application router, without the middleware layers.
pub fn build_test_app(state: SharedState) -> Router {
    routes::router(state)
}

pub async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("valid request");

    app.oneshot(request).await.expect("router is infallible")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None).await
}

/// Send a raw, possibly malformed, JSON body.
pub async fn post_raw(app: Router, uri: &str, body: &'static str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("valid request");
    app.oneshot(request).await.expect("router is infallible")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("readable body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("JSON body")
}

/// Description text that satisfies the length rule.
pub fn rules_text() -> String {
    "Roll five dice up to three times per turn and score the best combination. ".repeat(2)
}
