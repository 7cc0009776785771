use reqwest::StatusCode;
use thiserror::Error;

pub type CouchResult<T> = Result<T, CouchDaoError>;

#[derive(Debug, Error)]
pub enum CouchDaoError {
    #[error("COUCH_BASE_URL is not set")]
    MissingBaseUrl,
    #[error("could not build the CouchDB HTTP client")]
    Client {
        #[source]
        source: reqwest::Error,
    },
    /// The request never got an HTTP answer.
    #[error("CouchDB request to `{path}` failed")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("CouchDB answered {status} for `{path}`")]
    UnexpectedStatus { path: String, status: StatusCode },
    /// HTTP 409: the document changed since it was read.
    #[error("revision conflict on `{path}`")]
    RevisionConflict { path: String },
    #[error("gave up writing `{path}` after {attempts} revision conflicts")]
    ConflictRetriesExhausted { path: String, attempts: u32 },
    #[error("unreadable CouchDB response for `{path}`")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("CouchDB document under `{path}` does not match the expected shape")]
    Document {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("description name `{name}` already exists")]
    DuplicateName { name: String },
}
