use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::{
    dao::{score_store::ScoreStore, storage::StorageError},
    services::description_service,
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Connect to the storage backend, seed defaults and keep the shared state in
/// degraded mode while it is unavailable. Runs forever.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn ScoreStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                seed_defaults(&state, &store).await;
                state.install_score_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                delay = INITIAL_DELAY;

                supervise(&state, &store).await;

                warn!("exhausted storage reconnect attempts; dropping the connection");
                state.clear_score_store().await;
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// Poll the store until it fails and cannot be reconnected.
async fn supervise(state: &SharedState, store: &Arc<dyn ScoreStore>) {
    loop {
        if store.health_check().await.is_ok() {
            if state.is_degraded() {
                info!("storage healthy again; leaving degraded mode");
                state.update_degraded(false);
            }
            sleep(HEALTH_POLL_INTERVAL).await;
            continue;
        }

        if !reconnect(state, store).await {
            return;
        }
        seed_defaults(state, store).await;
        state.update_degraded(false);
        sleep(HEALTH_POLL_INTERVAL).await;
    }
}

async fn reconnect(state: &SharedState, store: &Arc<dyn ScoreStore>) -> bool {
    let mut reconnect_delay = INITIAL_DELAY;

    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "storage reconnection succeeded after health check failure");
                return true;
            }
            Err(err) => {
                if attempt == 0 {
                    warn!(
                        attempt, error = %err,
                        "storage reconnect first attempt failed; entering degraded mode"
                    );
                    state.update_degraded(true);
                } else {
                    warn!(attempt, error = %err, "storage reconnect attempt failed");
                }
                sleep(reconnect_delay).await;
                reconnect_delay = (reconnect_delay * 2).min(MAX_DELAY);
            }
        }
    }

    false
}

async fn seed_defaults(state: &SharedState, store: &Arc<dyn ScoreStore>) {
    let defaults = state.config().default_descriptions();
    match description_service::seed_default_descriptions(store, defaults).await {
        Ok(0) => {}
        Ok(count) => info!(count, "seeded default descriptions"),
        Err(err) => error!(error = %err, "failed to seed default descriptions"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig, dao::score_store::memory::MemoryScoreStore, state::AppState,
    };

    #[tokio::test]
    async fn installs_the_store_and_seeds_defaults() {
        let state = AppState::new(AppConfig::builtin());
        let memory = MemoryScoreStore::new();
        let handle = memory.clone();

        let task = tokio::spawn(run(state.clone(), move || {
            let store: Arc<dyn ScoreStore> = Arc::new(memory.clone());
            async move { Ok(store) }
        }));

        while state.is_degraded() {
            tokio::task::yield_now().await;
        }

        let seeded = ScoreStore::list_descriptions(&handle).await.unwrap();
        assert_eq!(seeded.len(), AppConfig::builtin().default_descriptions().len());
        assert!(seeded.iter().all(|d| d.is_default));

        task.abort();
    }
}
