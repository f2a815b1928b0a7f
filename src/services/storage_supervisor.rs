use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{arcade_store::ArcadeStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Outcome of trying to bring a failing store back.
async fn recover(state: &SharedState, store: &Arc<dyn ArcadeStore>) -> bool {
    let mut reconnect_delay = INITIAL_DELAY;

    for attempt in 0..MAX_RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => {
                info!(attempt, "storage reconnection succeeded after health check failure");
                return true;
            }
            Err(reconnect_err) => {
                if attempt == 0 {
                    warn!(
                        attempt, error = %reconnect_err,
                        "storage reconnect first attempt failed; entering degraded mode"
                    );
                    state.update_degraded(true).await;
                } else {
                    warn!(attempt, error = %reconnect_err, "storage reconnect attempt failed");
                }
                sleep(reconnect_delay).await;
                reconnect_delay = (reconnect_delay * 2).min(MAX_DELAY);
            }
        }
    }
    false
}

/// Connect to the storage backend, poll its health, and keep the shared state
/// in degraded mode while it is unreachable.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn ArcadeStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.set_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                delay = INITIAL_DELAY;

                loop {
                    match store.health_check().await {
                        Ok(()) => {
                            if state.is_degraded().await {
                                info!("storage healthy again; leaving degraded mode");
                                state.update_degraded(false).await;
                            }
                        }
                        Err(err) => {
                            warn!(error = %err, "storage health check failed");
                            if recover(&state, &store).await {
                                state.update_degraded(false).await;
                            } else {
                                warn!("exhausted storage reconnect attempts; reconnecting from scratch");
                                state.clear_store().await;
                                break;
                            }
                        }
                    }
                    sleep(HEALTH_POLL_INTERVAL).await;
                }

                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(err) => {
                warn!(error = %err, ?delay, "storage connection attempt failed");
                state.update_degraded(true).await;
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::arcade_store::memory::MemoryStore,
        state::AppState,
    };

    #[tokio::test]
    async fn installs_store_and_leaves_degraded_mode() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded().await);

        let mut watcher = state.degraded_watcher();
        let task = tokio::spawn(run(state.clone(), || async {
            Ok(Arc::new(MemoryStore::new()) as Arc<dyn ArcadeStore>)
        }));

        watcher.wait_for(|degraded| !degraded).await.unwrap();
        assert!(state.require_store().await.is_ok());
        task.abort();
    }
}
