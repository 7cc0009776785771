//! Game operations behind the `/api/v1/games` routes.

use tracing::{debug, info};
use validator::Validate;

use crate::{
    dao::models::NewGameEntity,
    dto::{
        common::DeletedResponse,
        game::{CreateGameRequest, GameResponse, UpdateScoresRequest},
    },
    error::ServiceError,
    state::SharedState,
};

/// Reject blank path identifiers before touching the store.
pub(crate) fn require_id(id: &str, resource: &str) -> Result<String, ServiceError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ServiceError::InvalidInput(format!("{resource} id is required")));
    }
    Ok(id.to_owned())
}

/// All games, ordered by name.
pub async fn list_games(state: &SharedState) -> Result<Vec<GameResponse>, ServiceError> {
    let store = state.require_score_store().await?;
    let games = store.list_games().await?;
    Ok(games.into_iter().map(Into::into).collect())
}

/// Validate and persist a new game; every player starts with a single score of 0.
pub async fn create_game(
    state: &SharedState,
    request: CreateGameRequest,
) -> Result<GameResponse, ServiceError> {
    request.validate()?;
    let store = state.require_score_store().await?;

    let game = store.insert_game(NewGameEntity::from(request)).await?;
    info!(game_id = %game.id, players = game.players.len(), "game created");
    Ok(game.into())
}

pub async fn get_game(state: &SharedState, id: &str) -> Result<GameResponse, ServiceError> {
    let id = require_id(id, "game")?;
    let store = state.require_score_store().await?;

    match store.find_game(id.clone()).await? {
        Some(game) => Ok(game.into()),
        None => Err(game_not_found(&id)),
    }
}

/// Append one round of scores to a game.
pub async fn update_scores(
    state: &SharedState,
    id: &str,
    request: UpdateScoresRequest,
) -> Result<GameResponse, ServiceError> {
    let id = require_id(id, "game")?;
    request.validate()?;
    let store = state.require_score_store().await?;

    let Some(game) = store.append_scores(id.clone(), request.scores).await? else {
        return Err(game_not_found(&id));
    };
    debug!(game_id = %game.id, "scores appended");
    Ok(game.into())
}

pub async fn delete_game(state: &SharedState, id: &str) -> Result<DeletedResponse, ServiceError> {
    let id = require_id(id, "game")?;
    let store = state.require_score_store().await?;

    if !store.delete_game(id.clone()).await? {
        return Err(game_not_found(&id));
    }
    info!(game_id = %id, "game deleted");
    Ok(DeletedResponse::new(id))
}

fn game_not_found(id: &str) -> ServiceError {
    ServiceError::NotFound(format!("game `{id}` not found"))
}
