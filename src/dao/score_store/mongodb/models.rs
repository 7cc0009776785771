use mongodb::bson::{Bson, Document, doc, oid::ObjectId};
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::dao::models::{
    DescriptionEntity, GameEntity, NewDescriptionEntity, NewGameEntity, PlayerEntity,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoGameDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub players: Vec<PlayerEntity>,
}

impl From<NewGameEntity> for MongoGameDocument {
    fn from(value: NewGameEntity) -> Self {
        Self {
            id: ObjectId::new(),
            name: value.name,
            players: value.players,
        }
    }
}

impl From<MongoGameDocument> for GameEntity {
    fn from(value: MongoGameDocument) -> Self {
        Self {
            id: value.id.to_hex(),
            name: value.name,
            players: value.players,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoDescriptionDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub description: String,
    #[serde(rename = "isDefaultField", default)]
    pub is_default: bool,
}

impl From<NewDescriptionEntity> for MongoDescriptionDocument {
    fn from(value: NewDescriptionEntity) -> Self {
        Self {
            id: ObjectId::new(),
            name: value.name,
            description: value.description,
            is_default: value.is_default,
        }
    }
}

impl From<MongoDescriptionDocument> for DescriptionEntity {
    fn from(value: MongoDescriptionDocument) -> Self {
        Self {
            id: value.id.to_hex(),
            name: value.name,
            description: value.description,
            is_default: value.is_default,
        }
    }
}

/// Parse an API identifier; anything other than the lowercase hex of an ObjectId cannot exist.
pub fn parse_object_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok().filter(|oid| oid.to_hex() == id)
}

pub fn doc_id(id: ObjectId) -> Document {
    doc! {"_id": id}
}

/// Integral scores keep their integer representation, everything else is stored as a double.
pub fn score_as_bson(score: &Number) -> Bson {
    match score.as_i64() {
        Some(value) => Bson::Int64(value),
        None => Bson::Double(score.as_f64().unwrap_or_default()),
    }
}

/// Build the `$push` operator appending `scores[i]` to `players.i.scores`.
pub fn push_scores_update(player_count: usize, scores: &[Number]) -> Document {
    let mut push = Document::new();
    for (index, score) in scores.iter().take(player_count).enumerate() {
        push.insert(format!("players.{index}.scores"), score_as_bson(score));
    }
    doc! { "$push": push }
}
