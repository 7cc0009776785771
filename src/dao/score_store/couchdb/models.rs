use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::dao::models::{
    DescriptionEntity, DescriptionPatch, GameEntity, NewDescriptionEntity, NewGameEntity,
    PlayerEntity,
};

pub const GAME_PREFIX: &str = "game::";
pub const DESCRIPTION_PREFIX: &str = "description::";
pub const END_SUFFIX: &str = "\u{ffff}";
/// Marker document recording that default descriptions were seeded.
pub const DEFAULTS_MARKER_ID: &str = "meta::default_descriptions";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    #[serde(default)]
    pub doc: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchGameDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub game: GameBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameBody {
    pub name: String,
    pub players: Vec<PlayerEntity>,
}

impl CouchGameDocument {
    /// Wrap a new game under a freshly generated id.
    pub fn create(game: NewGameEntity) -> Self {
        Self {
            id: game_doc_id(&Uuid::new_v4()),
            rev: None,
            game: GameBody {
                name: game.name,
                players: game.players,
            },
        }
    }

    pub fn into_entity(self) -> GameEntity {
        GameEntity {
            id: strip_prefix(&self.id, GAME_PREFIX),
            name: self.game.name,
            players: self.game.players,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchDescriptionDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub description: DescriptionBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptionBody {
    pub name: String,
    pub description: String,
    #[serde(rename = "isDefaultField", default)]
    pub is_default: bool,
}

impl CouchDescriptionDocument {
    pub fn create(description: NewDescriptionEntity) -> Self {
        Self {
            id: description_doc_id(&Uuid::new_v4()),
            rev: None,
            description: DescriptionBody {
                name: description.name,
                description: description.description,
                is_default: description.is_default,
            },
        }
    }

    /// Merge the patch fields, keeping the revision so the write is conditional.
    pub fn apply(&mut self, patch: DescriptionPatch) {
        self.description.name = patch.name;
        self.description.description = patch.description;
    }

    pub fn into_entity(self) -> DescriptionEntity {
        DescriptionEntity {
            id: strip_prefix(&self.id, DESCRIPTION_PREFIX),
            name: self.description.name,
            description: self.description.description,
            is_default: self.description.is_default,
        }
    }
}

pub fn game_doc_id(id: &Uuid) -> String {
    format!("{}{}", GAME_PREFIX, id)
}

pub fn description_doc_id(id: &Uuid) -> String {
    format!("{}{}", DESCRIPTION_PREFIX, id)
}

/// Map an API identifier to a document id.
///
/// Only the lowercase hyphenated form handed out by this store is accepted, so
/// each document answers to exactly one identifier.
pub fn parse_doc_id(prefix: &str, id: &str) -> Option<String> {
    Uuid::parse_str(id)
        .ok()
        .filter(|uuid| uuid.hyphenated().to_string() == id)
        .map(|uuid| format!("{}{}", prefix, uuid))
}

fn strip_prefix(doc_id: &str, prefix: &str) -> String {
    doc_id.strip_prefix(prefix).unwrap_or(doc_id).to_owned()
}
