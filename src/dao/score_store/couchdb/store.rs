use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Number, Value, from_value, json};
use tracing::debug;

use crate::dao::{
    models::{
        DescriptionEntity, DescriptionPatch, DescriptionUpdate, GameEntity, NewDescriptionEntity,
        NewGameEntity, append_scores,
    },
    score_store::ScoreStore,
    storage::StorageResult,
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        AllDocsResponse, CouchDescriptionDocument, CouchGameDocument, DEFAULTS_MARKER_ID,
        DESCRIPTION_PREFIX, END_SUFFIX, GAME_PREFIX, parse_doc_id,
    },
};

/// Upper bound on revision-checked write attempts for a single operation.
const MAX_WRITE_ATTEMPTS: u32 = 8;

#[derive(Clone)]
pub struct CouchScoreStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchScoreStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::Client { source })?;

        let store = Self {
            client,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            database: Arc::from(config.database),
            auth: config
                .credentials
                .map(|(user, pass)| (Arc::<str>::from(user), Arc::<str>::from(pass))),
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth {
            Some((ref user, ref pass)) => builder.basic_auth(user.as_ref(), Some(pass.as_ref())),
            None => builder,
        }
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.database_url(), path);
        self.authorize(self.client.request(method, url))
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = self.database_url();

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                path: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                debug!(%database, "creating CouchDB database");
                let create = self
                    .authorize(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::Transport {
                        path: database.clone(),
                        source,
                    })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::UnexpectedStatus {
                        path: database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::UnexpectedStatus {
                path: database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                path: doc_id.to_owned(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::Decode {
                        path: doc_id.to_owned(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::UnexpectedStatus {
                path: doc_id.to_owned(),
                status: other,
            }),
        }
    }

    /// PUT a document. A stale or missing `_rev` on an existing document fails
    /// with [`CouchDaoError::RevisionConflict`].
    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<()>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                path: doc_id.to_owned(),
                source,
            })?;

        match response.status() {
            StatusCode::CONFLICT => Err(CouchDaoError::RevisionConflict {
                path: doc_id.to_owned(),
            }),
            status if status.is_success() => Ok(()),
            other => Err(CouchDaoError::UnexpectedStatus {
                path: doc_id.to_owned(),
                status: other,
            }),
        }
    }

    /// DELETE a document at `rev`; returns `false` when it is already gone.
    async fn delete_document(&self, doc_id: &str, rev: &str) -> CouchResult<bool> {
        let response = self
            .request(Method::DELETE, doc_id)
            .query(&[("rev", rev)])
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                path: doc_id.to_owned(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            StatusCode::CONFLICT => Err(CouchDaoError::RevisionConflict {
                path: doc_id.to_owned(),
            }),
            status if status.is_success() => Ok(true),
            other => Err(CouchDaoError::UnexpectedStatus {
                path: doc_id.to_owned(),
                status: other,
            }),
        }
    }

    async fn list_documents<T>(&self, prefix: &str) -> CouchResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        const ALL_DOCS: &str = "_all_docs";
        let query = [
            ("include_docs", "true".to_owned()),
            ("startkey", format!("\"{}\"", prefix)),
            ("endkey", format!("\"{}{}\"", prefix, END_SUFFIX)),
        ];

        let response = self
            .request(Method::GET, ALL_DOCS)
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::Transport {
                path: ALL_DOCS.to_owned(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::UnexpectedStatus {
                path: ALL_DOCS.to_owned(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::Decode {
                path: ALL_DOCS.to_owned(),
                source,
            }
        })?;

        payload
            .rows
            .into_iter()
            .filter_map(|row| row.doc)
            .map(|doc| {
                from_value(doc).map_err(|source| CouchDaoError::Document {
                    path: ALL_DOCS.to_owned(),
                    source,
                })
            })
            .collect()
    }

    async fn defaults_seeded(&self) -> CouchResult<bool> {
        Ok(self
            .get_document::<Value>(DEFAULTS_MARKER_ID)
            .await?
            .is_some())
    }

    async fn mark_defaults_seeded(&self) -> CouchResult<()> {
        match self
            .put_document(DEFAULTS_MARKER_ID, &json!({"seeded": true}))
            .await
        {
            // Already recorded by an earlier run.
            Ok(()) | Err(CouchDaoError::RevisionConflict { .. }) => Ok(()),
            Err(err) => Err(err),
        }
    }

    async fn list_games(&self) -> CouchResult<Vec<GameEntity>> {
        let mut games = self
            .list_documents::<CouchGameDocument>(GAME_PREFIX)
            .await?
            .into_iter()
            .map(CouchGameDocument::into_entity)
            .collect::<Vec<_>>();
        games.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(games)
    }

    async fn insert_game(&self, game: NewGameEntity) -> CouchResult<GameEntity> {
        let document = CouchGameDocument::create(game);
        self.put_document(&document.id, &document).await?;
        Ok(document.into_entity())
    }

    async fn find_game(&self, id: &str) -> CouchResult<Option<GameEntity>> {
        let Some(doc_id) = parse_doc_id(GAME_PREFIX, id) else {
            return Ok(None);
        };
        let document = self.get_document::<CouchGameDocument>(&doc_id).await?;
        Ok(document.map(CouchGameDocument::into_entity))
    }

    /// Optimistic read-modify-write keyed on `_rev`; a concurrent writer forces a re-read.
    async fn append_scores(&self, id: &str, scores: &[Number]) -> CouchResult<Option<GameEntity>> {
        let Some(doc_id) = parse_doc_id(GAME_PREFIX, id) else {
            return Ok(None);
        };

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let Some(mut document) = self.get_document::<CouchGameDocument>(&doc_id).await? else {
                return Ok(None);
            };
            append_scores(&mut document.game.players, scores);

            match self.put_document(&doc_id, &document).await {
                Ok(()) => return Ok(Some(document.into_entity())),
                Err(CouchDaoError::RevisionConflict { .. }) => {
                    debug!(%doc_id, attempt, "score append hit a revision conflict; retrying");
                }
                Err(err) => return Err(err),
            }
        }

        Err(CouchDaoError::ConflictRetriesExhausted {
            path: doc_id,
            attempts: MAX_WRITE_ATTEMPTS,
        })
    }

    async fn delete_with_retry(&self, doc_id: String) -> CouchResult<bool> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let Some(document) = self.get_document::<Value>(&doc_id).await? else {
                return Ok(false);
            };
            let Some(rev) = document.get("_rev").and_then(|rev| rev.as_str()) else {
                return Ok(false);
            };

            match self.delete_document(&doc_id, rev).await {
                Ok(deleted) => return Ok(deleted),
                Err(CouchDaoError::RevisionConflict { .. }) => {
                    debug!(%doc_id, attempt, "delete hit a revision conflict; retrying");
                }
                Err(err) => return Err(err),
            }
        }

        Err(CouchDaoError::ConflictRetriesExhausted {
            path: doc_id,
            attempts: MAX_WRITE_ATTEMPTS,
        })
    }

    async fn list_descriptions(&self) -> CouchResult<Vec<DescriptionEntity>> {
        let mut descriptions = self
            .list_documents::<CouchDescriptionDocument>(DESCRIPTION_PREFIX)
            .await?
            .into_iter()
            .map(CouchDescriptionDocument::into_entity)
            .collect::<Vec<_>>();
        descriptions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(descriptions)
    }

    async fn find_description_by_name(&self, name: &str) -> CouchResult<Option<DescriptionEntity>> {
        Ok(self
            .list_descriptions()
            .await?
            .into_iter()
            .find(|description| description.name == name))
    }

    // CouchDB has no secondary unique constraint; the name check here narrows
    // but does not close the window between two concurrent creates.
    async fn insert_description(
        &self,
        description: NewDescriptionEntity,
    ) -> CouchResult<DescriptionEntity> {
        if self
            .find_description_by_name(&description.name)
            .await?
            .is_some()
        {
            return Err(CouchDaoError::DuplicateName {
                name: description.name,
            });
        }

        let document = CouchDescriptionDocument::create(description);
        self.put_document(&document.id, &document).await?;
        Ok(document.into_entity())
    }

    async fn find_description(&self, id: &str) -> CouchResult<Option<DescriptionEntity>> {
        let Some(doc_id) = parse_doc_id(DESCRIPTION_PREFIX, id) else {
            return Ok(None);
        };
        let document = self
            .get_document::<CouchDescriptionDocument>(&doc_id)
            .await?;
        Ok(document.map(CouchDescriptionDocument::into_entity))
    }

    async fn update_description(
        &self,
        id: &str,
        patch: DescriptionPatch,
    ) -> CouchResult<DescriptionUpdate> {
        let Some(doc_id) = parse_doc_id(DESCRIPTION_PREFIX, id) else {
            return Ok(DescriptionUpdate::Missing);
        };

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let Some(mut document) = self
                .get_document::<CouchDescriptionDocument>(&doc_id)
                .await?
            else {
                return Ok(DescriptionUpdate::Missing);
            };
            if document.description.is_default {
                return Ok(DescriptionUpdate::Locked);
            }
            if document.description.name != patch.name {
                if let Some(other) = self.find_description_by_name(&patch.name).await? {
                    if other.id != id {
                        return Err(CouchDaoError::DuplicateName { name: patch.name });
                    }
                }
            }

            document.apply(patch.clone());
            match self.put_document(&doc_id, &document).await {
                Ok(()) => return Ok(DescriptionUpdate::Updated(document.into_entity())),
                Err(CouchDaoError::RevisionConflict { .. }) => {
                    debug!(%doc_id, attempt, "description update hit a revision conflict; retrying");
                }
                Err(err) => return Err(err),
            }
        }

        Err(CouchDaoError::ConflictRetriesExhausted {
            path: doc_id,
            attempts: MAX_WRITE_ATTEMPTS,
        })
    }
}

impl ScoreStore for CouchScoreStore {
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
        Box::pin(async move {
            let Some(doc_id) = parse_doc_id(GAME_PREFIX, &id) else {
                return Ok(false);
            };
            store.delete_with_retry(doc_id).await.map_err(Into::into)
        })
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
        Box::pin(async move {
            let Some(doc_id) = parse_doc_id(DESCRIPTION_PREFIX, &id) else {
                return Ok(false);
            };
            store.delete_with_retry(doc_id).await.map_err(Into::into)
        })
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
        Box::pin(async move {
            let url = store.database_url();
            let response = store
                .authorize(store.client.get(&url))
                .send()
                .await
                .map_err(|source| CouchDaoError::Transport {
                    path: url.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::UnexpectedStatus {
                    path: url,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
