//! Integration tests for the `/api/v1/games` endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, connected_state, delete, get, post_json, post_raw, put_json};
use serde_json::{Value, json};

async fn create_game(app: axum::Router, players: &[&str]) -> Value {
    let response = post_json(
        app,
        "/api/v1/games",
        json!({ "name": "Yahtzee night", "players": players }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[tokio::test]
async fn created_game_starts_every_player_at_zero() {
    let app = build_test_app(connected_state().await);
    let created = create_game(app.clone(), &["Alice", "Bob"]).await;
    let id = created["id"].as_str().unwrap();

    let response = get(app, &format!("/api/v1/games/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let game = body_json(response).await;
    assert_eq!(game["id"], id);
    assert_eq!(game["name"], "Yahtzee night");
    assert_eq!(
        game["players"],
        json!([
            { "name": "Alice", "scores": [0] },
            { "name": "Bob", "scores": [0] },
        ])
    );
}

#[tokio::test]
async fn invalid_players_are_rejected() {
    let app = build_test_app(connected_state().await);

    for players in [json!([]), json!(["Al"]), json!(["Alice", "x".repeat(20)])] {
        let response = post_json(
            app.clone(),
            "/api/v1/games",
            json!({ "name": "Yahtzee", "players": players }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{players}");
        let body = body_json(response).await;
        let message = body["message"].as_str().unwrap();
        assert!(message.starts_with("players"), "{message}");
    }
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = build_test_app(connected_state().await);
    let response = post_raw(app, "/api/v1/games", r#"{"name": "Yahtzee", "players": ["#).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["message"].is_string());
}

#[tokio::test]
async fn games_are_listed_by_name() {
    let app = build_test_app(connected_state().await);
    assert_eq!(body_json(get(app.clone(), "/api/v1/games").await).await, json!([]));

    for name in ["Tarot", "Belote", "Rami"] {
        let response = post_json(
            app.clone(),
            "/api/v1/games",
            json!({ "name": name, "players": ["Alice"] }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let games = body_json(get(app, "/api/v1/games").await).await;
    let names: Vec<&str> = games
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Belote", "Rami", "Tarot"]);
}

#[tokio::test]
async fn score_update_appends_one_entry_per_player() {
    let app = build_test_app(connected_state().await);
    let created = create_game(app.clone(), &["Alice", "Bob"]).await;
    let uri = format!("/api/v1/games/{}", created["id"].as_str().unwrap());

    let response = put_json(app.clone(), &uri, json!({ "scores": [12, -3.5] })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let game = body_json(response).await;
    assert_eq!(game["players"][0]["scores"], json!([0, 12]));
    assert_eq!(game["players"][1]["scores"], json!([0, -3.5]));
}

#[tokio::test]
async fn excess_and_missing_scores_are_positional() {
    let app = build_test_app(connected_state().await);
    let created = create_game(app.clone(), &["Alice", "Bob"]).await;
    let uri = format!("/api/v1/games/{}", created["id"].as_str().unwrap());

    let game = body_json(put_json(app.clone(), &uri, json!({ "scores": [1, 2, 3] })).await).await;
    assert_eq!(game["players"][0]["scores"], json!([0, 1]));
    assert_eq!(game["players"][1]["scores"], json!([0, 2]));

    let game = body_json(put_json(app, &uri, json!({ "scores": [5] })).await).await;
    assert_eq!(game["players"][0]["scores"], json!([0, 1, 5]));
    assert_eq!(game["players"][1]["scores"], json!([0, 2]));
}

#[tokio::test]
async fn invalid_score_payloads_are_rejected() {
    let app = build_test_app(connected_state().await);
    let created = create_game(app.clone(), &["Alice"]).await;
    let uri = format!("/api/v1/games/{}", created["id"].as_str().unwrap());

    for body in [
        json!({}),
        json!({ "scores": 3 }),
        json!({ "scores": [1, "two"] }),
        json!({ "scores": [] }),
    ] {
        let response = put_json(app.clone(), &uri, body.clone()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
    }

    let game = body_json(get(app, &uri).await).await;
    assert_eq!(game["players"][0]["scores"], json!([0]));
}

#[tokio::test]
async fn concurrent_score_updates_are_not_lost() {
    let app = build_test_app(connected_state().await);
    let created = create_game(app.clone(), &["Alice"]).await;
    let uri = format!("/api/v1/games/{}", created["id"].as_str().unwrap());

    let updates = (0..25).map(|round| {
        let app = app.clone();
        let uri = uri.clone();
        tokio::spawn(async move { put_json(app, &uri, json!({ "scores": [round] })).await.status() })
    });
    for update in futures::future::join_all(updates).await {
        assert_eq!(update.unwrap(), StatusCode::OK);
    }

    let game = body_json(get(app, &uri).await).await;
    assert_eq!(game["players"][0]["scores"].as_array().unwrap().len(), 26);
}

#[tokio::test]
async fn unknown_games_are_not_found() {
    let app = build_test_app(connected_state().await);

    let response = get(app.clone(), "/api/v1/games/missing").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = put_json(app.clone(), "/api/v1/games/missing", json!({ "scores": [1] })).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = delete(app, "/api/v1/games/missing").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await["message"],
        json!("game `missing` not found")
    );
}

#[tokio::test]
async fn blank_ids_are_bad_requests() {
    let app = build_test_app(connected_state().await);
    let response = get(app, "/api/v1/games/%20").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleted_games_disappear() {
    let app = build_test_app(connected_state().await);
    let created = create_game(app.clone(), &["Alice"]).await;
    let id = created["id"].as_str().unwrap();
    let uri = format!("/api/v1/games/{id}");

    let response = delete(app.clone(), &uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "id": id }));

    assert_eq!(get(app, &uri).await.status(), StatusCode::NOT_FOUND);
}
