#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    DescriptionEntity, DescriptionPatch, DescriptionUpdate, GameEntity, NewDescriptionEntity,
    NewGameEntity,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use serde_json::Number;

/// Abstraction over the persistence layer for games and descriptions.
///
/// Identifiers are opaque strings owned by the backend. An identifier the
/// backend cannot parse is reported the same way as a missing document.
pub trait ScoreStore: Send + Sync {
    /// All games ordered by name ascending.
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    /// Persist a new game and return it with its assigned id.
    fn insert_game(&self, game: NewGameEntity) -> BoxFuture<'static, StorageResult<GameEntity>>;
    fn find_game(&self, id: String) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Atomically append one score per player, positionally.
    ///
    /// Returns the game as stored after the append, or `None` if it does not exist.
    fn append_scores(
        &self,
        id: String,
        scores: Vec<Number>,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Delete a game, returning whether a document was removed.
    fn delete_game(&self, id: String) -> BoxFuture<'static, StorageResult<bool>>;

    /// All descriptions ordered by name ascending.
    fn list_descriptions(&self) -> BoxFuture<'static, StorageResult<Vec<DescriptionEntity>>>;
    /// Persist a new description. Fails with [`StorageError::Duplicate`] when the name is taken.
    ///
    /// [`StorageError::Duplicate`]: crate::dao::storage::StorageError::Duplicate
    fn insert_description(
        &self,
        description: NewDescriptionEntity,
    ) -> BoxFuture<'static, StorageResult<DescriptionEntity>>;
    fn find_description(
        &self,
        id: String,
    ) -> BoxFuture<'static, StorageResult<Option<DescriptionEntity>>>;
    /// Exact, case-sensitive lookup by name.
    fn find_description_by_name(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<DescriptionEntity>>>;
    /// Merge `patch` into a non-default description.
    fn update_description(
        &self,
        id: String,
        patch: DescriptionPatch,
    ) -> BoxFuture<'static, StorageResult<DescriptionUpdate>>;
    /// Delete a description, returning whether a document was removed.
    fn delete_description(&self, id: String) -> BoxFuture<'static, StorageResult<bool>>;

    /// Whether default descriptions were ever seeded into this store.
    fn defaults_seeded(&self) -> BoxFuture<'static, StorageResult<bool>>;
    /// Record that defaults were seeded, so later deletions of them stick.
    fn mark_defaults_seeded(&self) -> BoxFuture<'static, StorageResult<()>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
