use std::env;

use super::error::{CouchDaoError, CouchResult};

const DEFAULT_DATABASE: &str = "scoreboard";

/// Where the CouchDB server lives and which database holds the documents.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    pub base_url: String,
    pub database: String,
    /// Basic-auth username and password, sent only when both are set.
    pub credentials: Option<(String, String)>,
}

impl CouchConfig {
    /// Read `COUCH_BASE_URL` (required), `COUCH_DB`, `COUCH_USERNAME` and `COUCH_PASSWORD`.
    pub fn from_env() -> CouchResult<Self> {
        let base_url = non_blank_env("COUCH_BASE_URL").ok_or(CouchDaoError::MissingBaseUrl)?;
        let database =
            non_blank_env("COUCH_DB").unwrap_or_else(|| DEFAULT_DATABASE.to_owned());
        let credentials = non_blank_env("COUCH_USERNAME").zip(env::var("COUCH_PASSWORD").ok());

        Ok(Self {
            base_url,
            database,
            credentials,
        })
    }
}

fn non_blank_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
