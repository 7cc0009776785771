//! In-process store backed by concurrent maps, used for local runs and tests.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use serde_json::Number;
use uuid::Uuid;

use crate::dao::{
    models::{
        DescriptionEntity, DescriptionPatch, DescriptionUpdate, GameEntity, NewDescriptionEntity,
        NewGameEntity, PlayerEntity, append_scores,
    },
    score_store::ScoreStore,
    storage::{StorageError, StorageResult},
};

#[derive(Clone, Default)]
pub struct MemoryScoreStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    games: DashMap<String, GameRecord>,
    descriptions: DashMap<String, DescriptionEntity>,
    /// Name to id index enforcing unique description names.
    description_names: DashMap<String, String>,
    defaults_seeded: AtomicBool,
}

struct GameRecord {
    name: String,
    players: Vec<PlayerEntity>,
}

impl GameRecord {
    fn to_entity(&self, id: &str) -> GameEntity {
        GameEntity {
            id: id.to_owned(),
            name: self.name.clone(),
            players: self.players.clone(),
        }
    }
}

fn duplicate_name(name: &str) -> StorageError {
    StorageError::duplicate(format!("description name `{name}` already exists"))
}

impl MemoryScoreStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn list_games(&self) -> Vec<GameEntity> {
        let mut games = self
            .inner
            .games
            .iter()
            .map(|entry| entry.value().to_entity(entry.key()))
            .collect::<Vec<_>>();
        games.sort_by(|a, b| a.name.cmp(&b.name));
        games
    }

    fn insert_game(&self, game: NewGameEntity) -> GameEntity {
        let id = Uuid::new_v4().to_string();
        let record = GameRecord {
            name: game.name,
            players: game.players,
        };
        let entity = record.to_entity(&id);
        self.inner.games.insert(id, record);
        entity
    }

    fn find_game(&self, id: &str) -> Option<GameEntity> {
        self.inner
            .games
            .get(id)
            .map(|record| record.to_entity(id))
    }

    fn append_scores(&self, id: &str, scores: &[Number]) -> Option<GameEntity> {
        // The entry guard keeps the shard locked for the whole read-modify-write.
        let mut record = self.inner.games.get_mut(id)?;
        append_scores(&mut record.players, scores);
        Some(record.to_entity(id))
    }

    fn list_descriptions(&self) -> Vec<DescriptionEntity> {
        let mut descriptions = self
            .inner
            .descriptions
            .iter()
            .map(|entry| entry.value().clone())
            .collect::<Vec<_>>();
        descriptions.sort_by(|a, b| a.name.cmp(&b.name));
        descriptions
    }

    fn insert_description(
        &self,
        description: NewDescriptionEntity,
    ) -> StorageResult<DescriptionEntity> {
        let id = Uuid::new_v4().to_string();
        match self.inner.description_names.entry(description.name.clone()) {
            Entry::Occupied(_) => return Err(duplicate_name(&description.name)),
            Entry::Vacant(slot) => {
                slot.insert(id.clone());
            }
        }

        let entity = DescriptionEntity {
            id: id.clone(),
            name: description.name,
            description: description.description,
            is_default: description.is_default,
        };
        self.inner.descriptions.insert(id, entity.clone());
        Ok(entity)
    }

    fn find_description_by_name(&self, name: &str) -> Option<DescriptionEntity> {
        let id = self.inner.description_names.get(name)?.value().clone();
        self.inner
            .descriptions
            .get(&id)
            .map(|entry| entry.value().clone())
    }

    fn update_description(
        &self,
        id: &str,
        patch: DescriptionPatch,
    ) -> StorageResult<DescriptionUpdate> {
        let Some(mut entry) = self.inner.descriptions.get_mut(id) else {
            return Ok(DescriptionUpdate::Missing);
        };
        if entry.is_default {
            return Ok(DescriptionUpdate::Locked);
        }

        if entry.name != patch.name {
            match self.inner.description_names.entry(patch.name.clone()) {
                Entry::Occupied(_) => return Err(duplicate_name(&patch.name)),
                Entry::Vacant(slot) => {
                    slot.insert(id.to_owned());
                }
            }
            self.inner
                .description_names
                .remove_if(&entry.name, |_, owner| owner == id);
        }

        entry.name = patch.name;
        entry.description = patch.description;
        Ok(DescriptionUpdate::Updated(entry.clone()))
    }

    fn delete_description(&self, id: &str) -> bool {
        let Some((_, removed)) = self.inner.descriptions.remove(id) else {
            return false;
        };
        self.inner
            .description_names
            .remove_if(&removed.name, |_, owner| owner == id);
        true
    }
}

impl ScoreStore for MemoryScoreStore {
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.list_games()) })
    }

    fn insert_game(&self, game: NewGameEntity) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.insert_game(game)) })
    }

    fn find_game(&self, id: String) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.find_game(&id)) })
    }

    fn append_scores(
        &self,
        id: String,
        scores: Vec<Number>,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.append_scores(&id, &scores)) })
    }

    fn delete_game(&self, id: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.games.remove(&id).is_some()) })
    }

    fn list_descriptions(&self) -> BoxFuture<'static, StorageResult<Vec<DescriptionEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.list_descriptions()) })
    }

    fn insert_description(
        &self,
        description: NewDescriptionEntity,
    ) -> BoxFuture<'static, StorageResult<DescriptionEntity>> {
        let store = self.clone();
        Box::pin(async move { store.insert_description(description) })
    }

    fn find_description(
        &self,
        id: String,
    ) -> BoxFuture<'static, StorageResult<Option<DescriptionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .descriptions
                .get(&id)
                .map(|entry| entry.value().clone()))
        })
    }

    fn find_description_by_name(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<DescriptionEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.find_description_by_name(&name)) })
    }

    fn update_description(
        &self,
        id: String,
        patch: DescriptionPatch,
    ) -> BoxFuture<'static, StorageResult<DescriptionUpdate>> {
        let store = self.clone();
        Box::pin(async move { store.update_description(&id, patch) })
    }

    fn delete_description(&self, id: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.delete_description(&id)) })
    }

    fn defaults_seeded(&self) -> BoxFuture<'static, StorageResult<bool>> {
        let seeded = self.inner.defaults_seeded.load(Ordering::Acquire);
        Box::pin(async move { Ok(seeded) })
    }

    fn mark_defaults_seeded(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.defaults_seeded.store(true, Ordering::Release);
        Box::pin(async { Ok(()) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_description(name: &str, is_default: bool) -> NewDescriptionEntity {
        NewDescriptionEntity {
            name: name.into(),
            description: "rules".into(),
            is_default,
        }
    }

    fn new_game(name: &str, players: &[&str]) -> NewGameEntity {
        NewGameEntity {
            name: name.into(),
            players: players
                .iter()
                .map(|p| PlayerEntity::new((*p).into()))
                .collect(),
        }
    }

    #[tokio::test]
    async fn games_are_listed_by_name() {
        let store = MemoryScoreStore::new();
        store.insert_game(new_game("Yahtzee", &["Alice"]));
        store.insert_game(new_game("Bridge", &["Bob"]));
        store.insert_game(new_game("Monopoly", &["Carol"]));

        let names = ScoreStore::list_games(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Bridge", "Monopoly", "Yahtzee"]);
    }

    #[tokio::test]
    async fn append_scores_on_missing_game_returns_none() {
        let store = MemoryScoreStore::new();
        let result = ScoreStore::append_scores(&store, "nope".into(), vec![Number::from(1)])
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn concurrent_appends_are_not_lost() {
        let store = MemoryScoreStore::new();
        let game = store.insert_game(new_game("Race", &["Alice"]));

        let tasks = (0..32)
            .map(|i| {
                let store = store.clone();
                let id = game.id.clone();
                tokio::spawn(async move {
                    ScoreStore::append_scores(&store, id, vec![Number::from(i)])
                        .await
                        .unwrap()
                })
            })
            .collect::<Vec<_>>();
        for task in tasks {
            task.await.unwrap();
        }

        let stored = store.find_game(&game.id).unwrap();
        assert_eq!(stored.players[0].scores.len(), 33);
    }

    #[test]
    fn duplicate_description_name_is_rejected() {
        let store = MemoryScoreStore::new();
        store
            .insert_description(new_description("Rummy", false))
            .unwrap();

        let err = store
            .insert_description(new_description("Rummy", false))
            .unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { .. }));
        assert_eq!(store.list_descriptions().len(), 1);

        // Names are matched case-sensitively.
        assert!(
            store
                .insert_description(new_description("rummy", false))
                .is_ok()
        );
    }

    #[test]
    fn default_description_is_locked() {
        let store = MemoryScoreStore::new();
        let created = store
            .insert_description(new_description("Classic", true))
            .unwrap();

        let outcome = store
            .update_description(
                &created.id,
                DescriptionPatch {
                    name: "Changed".into(),
                    description: "other".into(),
                },
            )
            .unwrap();
        assert_eq!(outcome, DescriptionUpdate::Locked);
        assert_eq!(
            store.find_description_by_name("Classic").unwrap(),
            created
        );
    }

    #[test]
    fn rename_releases_previous_name() {
        let store = MemoryScoreStore::new();
        let created = store
            .insert_description(new_description("Old", false))
            .unwrap();

        let outcome = store
            .update_description(
                &created.id,
                DescriptionPatch {
                    name: "New".into(),
                    description: "updated".into(),
                },
            )
            .unwrap();
        assert!(matches!(outcome, DescriptionUpdate::Updated(ref d) if d.name == "New"));
        assert!(store.find_description_by_name("Old").is_none());
        assert!(
            store
                .insert_description(new_description("Old", false))
                .is_ok()
        );
    }

    #[test]
    fn delete_description_frees_the_name() {
        let store = MemoryScoreStore::new();
        let created = store
            .insert_description(new_description("Gone", false))
            .unwrap();

        assert!(store.delete_description(&created.id));
        assert!(!store.delete_description(&created.id));
        assert!(store.find_description_by_name("Gone").is_none());
    }
}
