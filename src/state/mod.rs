pub mod game;
pub mod rate_limit;
pub mod rules;
pub mod status;

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::{RwLock, watch};

use crate::{config::AppConfig, dao::arcade_store::ArcadeStore, error::ServiceError};

use self::rate_limit::RateLimiter;

pub type SharedState = Arc<AppState>;

/// Central application state: the storage handle, degraded flag, configuration and
/// per-process rate limiting counters.
pub struct AppState {
    store: RwLock<Option<Arc<dyn ArcadeStore>>>,
    degraded: watch::Sender<bool>,
    config: AppConfig,
    rate_limiter: RateLimiter,
    started_at: Instant,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let rate_limiter = RateLimiter::new(config.rate_limit_window, config.rate_limit_max_requests);
        Arc::new(Self {
            store: RwLock::new(None),
            degraded: degraded_tx,
            config,
            rate_limiter,
            started_at: Instant::now(),
        })
    }

    /// Build a state that is immediately backed by `store`.
    pub async fn with_store(config: AppConfig, store: Arc<dyn ArcadeStore>) -> SharedState {
        let state = Self::new(config);
        state.set_store(store).await;
        state
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn store(&self) -> Option<Arc<dyn ArcadeStore>> {
        let guard = self.store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the current store or fail with [`ServiceError::Degraded`].
    pub async fn require_store(&self) -> Result<Arc<dyn ArcadeStore>, ServiceError> {
        if *self.degraded.borrow() {
            return Err(ServiceError::Degraded);
        }
        self.store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn set_store(&self, store: Arc<dyn ArcadeStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current store and enter degraded mode.
    pub async fn clear_store(&self) {
        {
            let mut guard = self.store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        if *self.degraded.borrow() {
            return true;
        }
        let guard = self.store.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub async fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Configuration loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Process-wide rate limiting counters.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Time elapsed since the state was created.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::arcade_store::memory::MemoryStore;

    #[tokio::test]
    async fn starts_degraded_until_store_installed() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded().await);
        assert!(matches!(
            state.require_store().await,
            Err(ServiceError::Degraded)
        ));

        state.set_store(Arc::new(MemoryStore::new())).await;
        assert!(!state.is_degraded().await);
        assert!(state.require_store().await.is_ok());

        let mut watcher = state.degraded_watcher();
        state.clear_store().await;
        assert!(state.is_degraded().await);
        assert!(*watcher.borrow_and_update());
    }

    #[tokio::test]
    async fn degraded_flag_blocks_installed_store() {
        let state = AppState::with_store(AppConfig::default(), Arc::new(MemoryStore::new())).await;
        state.update_degraded(true).await;
        assert!(state.require_store().await.is_err());
        state.update_degraded(false).await;
        assert!(state.require_store().await.is_ok());
    }
}
