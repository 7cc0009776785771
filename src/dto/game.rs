use serde::{Deserialize, Serialize};
use serde_json::Number;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::{GameEntity, NewGameEntity, PlayerEntity},
    dto::validation::{validate_game_name, validate_player_name},
};

/// Payload used to create a game.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateGameRequest {
    /// Game name, 2 to 75 characters once trimmed.
    pub name: String,
    /// Player names in seating order, each 3 to 19 characters once trimmed.
    pub players: Vec<String>,
}

impl Validate for CreateGameRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_game_name(&self.name) {
            errors.add("name", e);
        }

        if self.players.is_empty() {
            let mut err = ValidationError::new("players_empty");
            err.message = Some("A game requires at least one player".into());
            errors.add("players", err);
        }

        for (position, player) in self.players.iter().enumerate() {
            if let Err(e) = validate_player_name(player, position) {
                errors.add("players", e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<CreateGameRequest> for NewGameEntity {
    fn from(value: CreateGameRequest) -> Self {
        Self {
            name: value.name.trim().to_owned(),
            players: value
                .players
                .into_iter()
                .map(|player| PlayerEntity::new(player.trim().to_owned()))
                .collect(),
        }
    }
}

/// Scores of one round, aligned with the game's players.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateScoresRequest {
    /// `scores[i]` is appended to the i-th player. Extra entries are ignored.
    #[schema(value_type = Vec<f64>)]
    pub scores: Vec<Number>,
}

impl Validate for UpdateScoresRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        if !self.scores.is_empty() {
            return Ok(());
        }

        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("scores_empty");
        err.message = Some("At least one score is required".into());
        errors.add("scores", err);
        Err(errors)
    }
}

/// A game as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameResponse {
    pub id: String,
    pub name: String,
    pub players: Vec<PlayerResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerResponse {
    pub name: String,
    /// Score history; starts with the opening score of 0.
    #[schema(value_type = Vec<f64>)]
    pub scores: Vec<Number>,
}

impl From<PlayerEntity> for PlayerResponse {
    fn from(player: PlayerEntity) -> Self {
        Self {
            name: player.name,
            scores: player.scores,
        }
    }
}

impl From<GameEntity> for GameResponse {
    fn from(game: GameEntity) -> Self {
        Self {
            id: game.id,
            name: game.name,
            players: game.players.into_iter().map(Into::into).collect(),
        }
    }
}
