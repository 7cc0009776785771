use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Collection, Database,
    bson::{Document, doc},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
};
use serde_json::Number;
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::{open_database, ping},
    error::{MongoDaoError, MongoResult},
    models::{MongoDescriptionDocument, MongoGameDocument, doc_id, parse_object_id, push_scores_update},
};
use crate::dao::{
    models::{
        DescriptionEntity, DescriptionPatch, DescriptionUpdate, GameEntity, NewDescriptionEntity,
        NewGameEntity,
    },
    score_store::ScoreStore,
    storage::StorageResult,
};

const GAME_COLLECTION_NAME: &str = "games";
const DESCRIPTION_COLLECTION_NAME: &str = "descriptions";
const METADATA_COLLECTION_NAME: &str = "metadata";
/// `_id` of the marker recording that default descriptions were seeded.
const DEFAULTS_MARKER_ID: &str = "default_descriptions";
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct MongoScoreStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    database: RwLock<Database>,
    config: MongoConfig,
}

impl MongoInner {
    async fn check_health(&self) -> MongoResult<()> {
        let database = self.database.read().await.clone();
        ping(&database)
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let database = open_database(&self.config).await?;
        *self.database.write().await = database;
        Ok(())
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(failure)) => failure.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(failure) => failure.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

impl MongoScoreStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let database = open_database(&config).await?;

        let inner = Arc::new(MongoInner {
            database: RwLock::new(database),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let index = mongodb::IndexModel::builder()
            .keys(doc! {"name": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("game_name_idx".to_owned()))
                    .build(),
            )
            .build();

        self.games()
            .await
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: GAME_COLLECTION_NAME,
                index: "name",
                source,
            })?;

        // Description names are unique; the index backs the service-level check.
        let description_index = mongodb::IndexModel::builder()
            .keys(doc! {"name": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("description_name_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();

        self.descriptions()
            .await
            .create_index(description_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: DESCRIPTION_COLLECTION_NAME,
                index: "name",
                source,
            })?;

        Ok(())
    }

    async fn games(&self) -> Collection<MongoGameDocument> {
        let database = self.inner.database.read().await;
        database.collection::<MongoGameDocument>(GAME_COLLECTION_NAME)
    }

    async fn descriptions(&self) -> Collection<MongoDescriptionDocument> {
        let database = self.inner.database.read().await;
        database.collection::<MongoDescriptionDocument>(DESCRIPTION_COLLECTION_NAME)
    }

    async fn metadata(&self) -> Collection<Document> {
        let database = self.inner.database.read().await;
        database.collection::<Document>(METADATA_COLLECTION_NAME)
    }

    async fn defaults_seeded(&self) -> MongoResult<bool> {
        let marker = self
            .metadata()
            .await
            .find_one(doc! {"_id": DEFAULTS_MARKER_ID})
            .await
            .map_err(|source| MongoDaoError::Load {
                collection: METADATA_COLLECTION_NAME,
                id: DEFAULTS_MARKER_ID.to_owned(),
                source,
            })?;
        Ok(marker.is_some())
    }

    async fn mark_defaults_seeded(&self) -> MongoResult<()> {
        self.metadata()
            .await
            .update_one(
                doc! {"_id": DEFAULTS_MARKER_ID},
                doc! {"$set": {"seeded": true}},
            )
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Update {
                collection: METADATA_COLLECTION_NAME,
                id: DEFAULTS_MARKER_ID.to_owned(),
                source,
            })?;
        Ok(())
    }

    async fn list_games(&self) -> MongoResult<Vec<GameEntity>> {
        let documents: Vec<MongoGameDocument> = self
            .games()
            .await
            .find(doc! {})
            .sort(doc! {"name": 1})
            .await
            .map_err(|source| MongoDaoError::List {
                collection: GAME_COLLECTION_NAME,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::List {
                collection: GAME_COLLECTION_NAME,
                source,
            })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn insert_game(&self, game: NewGameEntity) -> MongoResult<GameEntity> {
        let document = MongoGameDocument::from(game);
        self.games()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::Insert {
                collection: GAME_COLLECTION_NAME,
                source,
            })?;

        Ok(document.into())
    }

    async fn find_game(&self, id: &str) -> MongoResult<Option<GameEntity>> {
        let Some(oid) = parse_object_id(id) else {
            return Ok(None);
        };

        let document = self
            .games()
            .await
            .find_one(doc_id(oid))
            .await
            .map_err(|source| MongoDaoError::Load {
                collection: GAME_COLLECTION_NAME,
                id: id.to_owned(),
                source,
            })?;

        Ok(document.map(Into::into))
    }

    async fn append_scores(&self, id: &str, scores: &[Number]) -> MongoResult<Option<GameEntity>> {
        let Some(oid) = parse_object_id(id) else {
            return Ok(None);
        };
        let collection = self.games().await;

        let current = collection
            .find_one(doc_id(oid))
            .await
            .map_err(|source| MongoDaoError::Load {
                collection: GAME_COLLECTION_NAME,
                id: id.to_owned(),
                source,
            })?;
        let Some(current) = current else {
            return Ok(None);
        };
        if scores.is_empty() || current.players.is_empty() {
            return Ok(Some(current.into()));
        }

        // `$push` is applied atomically on the server, so concurrent appends
        // never overwrite each other. The size guard pins the player layout the
        // positional paths were computed from.
        let player_count = current.players.len();
        let updated = collection
            .find_one_and_update(
                doc! {"_id": oid, "players": {"$size": player_count as i64}},
                push_scores_update(player_count, scores),
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::Update {
                collection: GAME_COLLECTION_NAME,
                id: id.to_owned(),
                source,
            })?;

        Ok(updated.map(Into::into))
    }

    async fn delete_game(&self, id: &str) -> MongoResult<bool> {
        let Some(oid) = parse_object_id(id) else {
            return Ok(false);
        };

        let result = self
            .games()
            .await
            .delete_one(doc_id(oid))
            .await
            .map_err(|source| MongoDaoError::Delete {
                collection: GAME_COLLECTION_NAME,
                id: id.to_owned(),
                source,
            })?;
        Ok(result.deleted_count > 0)
    }

    async fn list_descriptions(&self) -> MongoResult<Vec<DescriptionEntity>> {
        let documents: Vec<MongoDescriptionDocument> = self
            .descriptions()
            .await
            .find(doc! {})
            .sort(doc! {"name": 1})
            .await
            .map_err(|source| MongoDaoError::List {
                collection: DESCRIPTION_COLLECTION_NAME,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::List {
                collection: DESCRIPTION_COLLECTION_NAME,
                source,
            })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn insert_description(
        &self,
        description: NewDescriptionEntity,
    ) -> MongoResult<DescriptionEntity> {
        let document = MongoDescriptionDocument::from(description);
        let inserted = self.descriptions().await.insert_one(&document).await;
        match inserted {
            Ok(_) => Ok(document.into()),
            Err(source) if is_duplicate_key(&source) => Err(MongoDaoError::DuplicateName {
                name: document.name,
            }),
            Err(source) => Err(MongoDaoError::Insert {
                collection: DESCRIPTION_COLLECTION_NAME,
                source,
            }),
        }
    }

    async fn find_description(&self, id: &str) -> MongoResult<Option<DescriptionEntity>> {
        let Some(oid) = parse_object_id(id) else {
            return Ok(None);
        };

        let document = self
            .descriptions()
            .await
            .find_one(doc_id(oid))
            .await
            .map_err(|source| MongoDaoError::Load {
                collection: DESCRIPTION_COLLECTION_NAME,
                id: id.to_owned(),
                source,
            })?;

        Ok(document.map(Into::into))
    }

    async fn find_description_by_name(&self, name: &str) -> MongoResult<Option<DescriptionEntity>> {
        let document = self
            .descriptions()
            .await
            .find_one(doc! {"name": name})
            .await
            .map_err(|source| MongoDaoError::Load {
                collection: DESCRIPTION_COLLECTION_NAME,
                id: name.to_owned(),
                source,
            })?;

        Ok(document.map(Into::into))
    }

    async fn update_description(
        &self,
        id: &str,
        patch: DescriptionPatch,
    ) -> MongoResult<DescriptionUpdate> {
        let Some(oid) = parse_object_id(id) else {
            return Ok(DescriptionUpdate::Missing);
        };
        let collection = self.descriptions().await;

        let updated = collection
            .find_one_and_update(
                doc! {"_id": oid, "isDefaultField": {"$ne": true}},
                doc! {"$set": {"name": patch.name.as_str(), "description": patch.description.as_str()}},
            )
            .return_document(ReturnDocument::After)
            .await;

        match updated {
            Ok(Some(document)) => Ok(DescriptionUpdate::Updated(document.into())),
            Ok(None) => {
                // Nothing matched: either the document is gone or it is a default one.
                let existing = collection.find_one(doc_id(oid)).await.map_err(|source| {
                    MongoDaoError::Load {
                        collection: DESCRIPTION_COLLECTION_NAME,
                        id: id.to_owned(),
                        source,
                    }
                })?;
                Ok(match existing {
                    Some(_) => DescriptionUpdate::Locked,
                    None => DescriptionUpdate::Missing,
                })
            }
            Err(source) if is_duplicate_key(&source) => {
                Err(MongoDaoError::DuplicateName { name: patch.name })
            }
            Err(source) => Err(MongoDaoError::Update {
                collection: DESCRIPTION_COLLECTION_NAME,
                id: id.to_owned(),
                source,
            }),
        }
    }

    async fn delete_description(&self, id: &str) -> MongoResult<bool> {
        let Some(oid) = parse_object_id(id) else {
            return Ok(false);
        };

        let result = self
            .descriptions()
            .await
            .delete_one(doc_id(oid))
            .await
            .map_err(|source| MongoDaoError::Delete {
                collection: DESCRIPTION_COLLECTION_NAME,
                id: id.to_owned(),
                source,
            })?;
        Ok(result.deleted_count > 0)
    }
}

impl ScoreStore for MongoScoreStore {
    fn list_games(&self) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_games().await.map_err(Into::into) })
    }

    fn insert_game(&self, game: NewGameEntity) -> BoxFuture<'static, StorageResult<GameEntity>> {
        let store = self.clone();
        Box::pin(async move { store.insert_game(game).await.map_err(Into::into) })
    }

    fn find_game(&self, id: String) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_game(&id).await.map_err(Into::into) })
    }

    fn append_scores(
        &self,
        id: String,
        scores: Vec<Number>,
    ) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.append_scores(&id, &scores).await.map_err(Into::into) })
    }

    fn delete_game(&self, id: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_game(&id).await.map_err(Into::into) })
    }

    fn list_descriptions(&self) -> BoxFuture<'static, StorageResult<Vec<DescriptionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_descriptions().await.map_err(Into::into) })
    }

    fn insert_description(
        &self,
        description: NewDescriptionEntity,
    ) -> BoxFuture<'static, StorageResult<DescriptionEntity>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .insert_description(description)
                .await
                .map_err(Into::into)
        })
    }

    fn find_description(
        &self,
        id: String,
    ) -> BoxFuture<'static, StorageResult<Option<DescriptionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_description(&id).await.map_err(Into::into) })
    }

    fn find_description_by_name(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<DescriptionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_description_by_name(&name)
                .await
                .map_err(Into::into)
        })
    }

    fn update_description(
        &self,
        id: String,
        patch: DescriptionPatch,
    ) -> BoxFuture<'static, StorageResult<DescriptionUpdate>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_description(&id, patch)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_description(&self, id: String) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_description(&id).await.map_err(Into::into) })
    }

    fn defaults_seeded(&self) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.defaults_seeded().await.map_err(Into::into) })
    }

    fn mark_defaults_seeded(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.mark_defaults_seeded().await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.check_health().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
