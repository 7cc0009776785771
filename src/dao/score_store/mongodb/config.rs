use std::env;

use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

const DEFAULT_URI: &str = "mongodb://localhost:27017";
const DEFAULT_DATABASE: &str = "scoreboard";

/// Parsed client options plus the database holding the collections.
#[derive(Clone)]
pub struct MongoConfig {
    pub options: ClientOptions,
    pub database_name: String,
}

impl MongoConfig {
    /// Parse `uri`; a missing or blank `database` means `scoreboard`.
    pub async fn parse(uri: &str, database: Option<String>) -> MongoResult<Self> {
        let options = ClientOptions::parse(uri)
            .await
            .map_err(|source| MongoDaoError::InvalidUri {
                uri: uri.to_owned(),
                source,
            })?;
        let database_name = database
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE.to_owned());

        Ok(Self {
            options,
            database_name,
        })
    }

    /// Read `MONGO_URI` (defaults to a local server) and `MONGO_DB`.
    pub async fn from_env() -> MongoResult<Self> {
        let uri = env::var("MONGO_URI").unwrap_or_else(|_| DEFAULT_URI.to_owned());
        Self::parse(&uri, env::var("MONGO_DB").ok()).await
    }
}
