//! Client construction and the reachability check run before a handle is handed out.

use std::time::Duration;

use mongodb::{Client, Database, bson::doc, error::Error as MongoError};
use tokio::time::sleep;
use tracing::debug;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
};

const PING_ATTEMPTS: u32 = 6;
const FIRST_BACKOFF: Duration = Duration::from_millis(200);
const BACKOFF_CEILING: Duration = Duration::from_secs(3);

/// Open a database handle and wait until the server answers `ping`.
pub async fn open_database(config: &MongoConfig) -> MongoResult<Database> {
    let client = Client::with_options(config.options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(&config.database_name);

    let mut backoff = FIRST_BACKOFF;
    let mut attempt = 1;
    while let Err(source) = ping(&database).await {
        if attempt == PING_ATTEMPTS {
            return Err(MongoDaoError::InitialPing {
                attempts: attempt,
                source,
            });
        }
        debug!(
            attempt,
            database = %config.database_name,
            error = %source,
            "MongoDB not reachable yet"
        );
        sleep(backoff).await;
        backoff = (backoff * 2).min(BACKOFF_CEILING);
        attempt += 1;
    }

    Ok(database)
}

pub async fn ping(database: &Database) -> Result<(), MongoError> {
    database.run_command(doc! { "ping": 1 }).await.map(drop)
}
