use mongodb::error::Error as MongoError;
use thiserror::Error;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to insert into `{collection}`")]
    Insert {
        collection: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to load `{id}` from `{collection}`")]
    Load {
        collection: &'static str,
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to update `{id}` in `{collection}`")]
    Update {
        collection: &'static str,
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete `{id}` from `{collection}`")]
    Delete {
        collection: &'static str,
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to list `{collection}`")]
    List {
        collection: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("description name `{name}` already exists")]
    DuplicateName { name: String },
}
