use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Player entry stored inside a game document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerEntity {
    /// Display name of the player.
    pub name: String,
    /// Score history, one entry per round. The first entry is the opening score.
    pub scores: Vec<Number>,
}

impl PlayerEntity {
    /// Build a fresh player whose history starts at zero.
    pub fn new(name: String) -> Self {
        Self {
            name,
            scores: vec![Number::from(0)],
        }
    }
}

/// Persisted game along with the identifier assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct GameEntity {
    /// Opaque identifier assigned by the store.
    pub id: String,
    /// Human readable game name.
    pub name: String,
    /// Players in the order they were registered.
    pub players: Vec<PlayerEntity>,
}

/// Game content submitted for insertion, before the store assigns an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGameEntity {
    pub name: String,
    pub players: Vec<PlayerEntity>,
}

/// Persisted rule-set description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionEntity {
    /// Opaque identifier assigned by the store.
    pub id: String,
    /// Unique name of the description.
    pub name: String,
    /// Rule text.
    pub description: String,
    /// Whether the description ships with the system and must not be edited.
    pub is_default: bool,
}

/// Description content submitted for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDescriptionEntity {
    pub name: String,
    pub description: String,
    pub is_default: bool,
}

/// Fields merged into an existing description on update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptionPatch {
    pub name: String,
    pub description: String,
}

/// Result of a conditional description update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptionUpdate {
    /// The patch was applied; carries the stored document after the write.
    Updated(DescriptionEntity),
    /// No description exists with the requested id.
    Missing,
    /// The description is a default one and was left untouched.
    Locked,
}

/// Append `scores` positionally to the players of a game.
///
/// Extra scores are ignored and players without a matching score keep their
/// history unchanged.
pub fn append_scores(players: &mut [PlayerEntity], scores: &[Number]) {
    for (player, score) in players.iter_mut().zip(scores) {
        player.scores.push(score.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn players(names: &[&str]) -> Vec<PlayerEntity> {
        names.iter().map(|n| PlayerEntity::new((*n).into())).collect()
    }

    #[test]
    fn new_player_starts_at_zero() {
        let player = PlayerEntity::new("Alice".into());
        assert_eq!(player.scores, vec![Number::from(0)]);
    }

    #[test]
    fn append_scores_is_positional() {
        let mut list = players(&["Alice", "Bob"]);
        append_scores(&mut list, &[Number::from(5), Number::from(-2)]);

        assert_eq!(list[0].scores, vec![Number::from(0), Number::from(5)]);
        assert_eq!(list[1].scores, vec![Number::from(0), Number::from(-2)]);
    }

    #[test]
    fn append_scores_drops_extra_entries() {
        let mut list = players(&["Alice"]);
        append_scores(&mut list, &[Number::from(1), Number::from(2), Number::from(3)]);

        assert_eq!(list.len(), 1);
        assert_eq!(list[0].scores, vec![Number::from(0), Number::from(1)]);
    }

    #[test]
    fn append_scores_leaves_trailing_players_untouched() {
        let mut list = players(&["Alice", "Bob", "Carol"]);
        append_scores(&mut list, &[Number::from(7)]);

        assert_eq!(list[0].scores.len(), 2);
        assert_eq!(list[1].scores, vec![Number::from(0)]);
        assert_eq!(list[2].scores, vec![Number::from(0)]);
    }
}
