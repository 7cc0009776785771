use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::{
        common::DeletedResponse,
        game::{CreateGameRequest, GameResponse, UpdateScoresRequest},
    },
    error::{AppError, ErrorBody},
    routes::extract::ApiJson,
    services::game_service,
    state::SharedState,
};

/// Game CRUD and score rounds.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games", get(list_games).post(create_game))
        .route(
            "/games/{id}",
            get(get_game).put(update_scores).delete(delete_game),
        )
}

/// List every game ordered by name.
#[utoipa::path(
    get,
    path = "/api/v1/games",
    tag = "games",
    responses(
        (status = 200, description = "All games", body = [GameResponse]),
        (status = 503, description = "Storage unavailable", body = ErrorBody)
    )
)]
pub async fn list_games(
    State(state): State<SharedState>,
) -> Result<Json<Vec<GameResponse>>, AppError> {
    Ok(Json(game_service::list_games(&state).await?))
}

/// Create a game; every player starts with a score history of `[0]`.
#[utoipa::path(
    post,
    path = "/api/v1/games",
    tag = "games",
    request_body = CreateGameRequest,
    responses(
        (status = 201, description = "Game created", body = GameResponse),
        (status = 400, description = "Invalid game", body = ErrorBody)
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
    ApiJson(payload): ApiJson<CreateGameRequest>,
) -> Result<(StatusCode, Json<GameResponse>), AppError> {
    let game = game_service::create_game(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(game)))
}

#[utoipa::path(
    get,
    path = "/api/v1/games/{id}",
    tag = "games",
    params(("id" = String, Path, description = "Identifier of the game")),
    responses(
        (status = 200, description = "Game", body = GameResponse),
        (status = 404, description = "Unknown game", body = ErrorBody)
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<GameResponse>, AppError> {
    Ok(Json(game_service::get_game(&state, &id).await?))
}

/// Append one round of scores, `scores[i]` going to the i-th player.
#[utoipa::path(
    put,
    path = "/api/v1/games/{id}",
    tag = "games",
    params(("id" = String, Path, description = "Identifier of the game")),
    request_body = UpdateScoresRequest,
    responses(
        (status = 200, description = "Game after the append", body = GameResponse),
        (status = 400, description = "Invalid scores", body = ErrorBody),
        (status = 404, description = "Unknown game", body = ErrorBody)
    )
)]
pub async fn update_scores(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateScoresRequest>,
) -> Result<Json<GameResponse>, AppError> {
    Ok(Json(game_service::update_scores(&state, &id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/games/{id}",
    tag = "games",
    params(("id" = String, Path, description = "Identifier of the game")),
    responses(
        (status = 200, description = "Game deleted", body = DeletedResponse),
        (status = 404, description = "Unknown game", body = ErrorBody)
    )
)]
pub async fn delete_game(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, AppError> {
    Ok(Json(game_service::delete_game(&state, &id).await?))
}
