use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{config::AppConfig, dao::score_store::ScoreStore, error::ServiceError};

pub type SharedState = Arc<AppState>;

/// Central application state holding the storage handle and configuration.
pub struct AppState {
    score_store: RwLock<Option<Arc<dyn ScoreStore>>>,
    degraded: watch::Sender<bool>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            score_store: RwLock::new(None),
            degraded: degraded_tx,
            config,
        })
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn score_store(&self) -> Option<Arc<dyn ScoreStore>> {
        let guard = self.score_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the current store or fail with [`ServiceError::Degraded`].
    ///
    /// A store that is installed but failing its health checks is not handed out.
    pub async fn require_score_store(&self) -> Result<Arc<dyn ScoreStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.score_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn install_score_store(&self, store: Arc<dyn ScoreStore>) {
        {
            let mut guard = self.score_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current store and enter degraded mode.
    pub async fn clear_score_store(&self) {
        {
            let mut guard = self.score_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Flip the degraded flag, notifying watchers only on change.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::score_store::memory::MemoryScoreStore;

    #[tokio::test]
    async fn starts_degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded());
        assert!(matches!(
            state.require_score_store().await,
            Err(ServiceError::Degraded)
        ));

        state
            .install_score_store(Arc::new(MemoryScoreStore::new()))
            .await;
        assert!(!state.is_degraded());
        assert!(state.require_score_store().await.is_ok());

        state.clear_score_store().await;
        assert!(state.is_degraded());
    }

    #[test]
    fn degraded_flag_can_be_toggled_without_a_store() {
        let state = AppState::new(AppConfig::default());
        state.update_degraded(false);
        assert!(!state.is_degraded());
        state.update_degraded(true);
        assert!(state.is_degraded());
    }

    #[tokio::test]
    async fn degraded_store_is_not_handed_out() {
        let state = AppState::new(AppConfig::default());
        state
            .install_score_store(Arc::new(MemoryScoreStore::new()))
            .await;
        state.update_degraded(true);

        assert!(state.score_store().await.is_some());
        assert!(matches!(
            state.require_score_store().await,
            Err(ServiceError::Degraded)
        ));
    }
}
