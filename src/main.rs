//! Arcade Quiz Back binary entrypoint wiring configuration, storage and the REST API.

use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::Router;
use tokio::{net::TcpListener, time::interval};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arcade_quiz_back::{
    config::{AppConfig, StorageBackend},
    dao::arcade_store::{ArcadeStore, memory::MemoryStore},
    error, routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    error::expose_internal_errors(config.development);

    let app_state = AppState::new(config);
    start_storage(app_state.clone(), StorageBackend::from_env()).await;
    tokio::spawn(sweep_rate_limiter(app_state.clone()));

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Install the memory store directly, or hand the selected database backend
/// to the storage supervisor which keeps degraded mode in sync.
async fn start_storage(state: SharedState, backend: StorageBackend) {
    info!(?backend, "selecting storage backend");
    match backend {
        StorageBackend::Memory => {
            warn!("using in-memory storage; data is lost on restart");
            state.set_store(Arc::new(MemoryStore::new())).await;
        }
        #[cfg(feature = "mongo-store")]
        StorageBackend::Mongo => {
            use arcade_quiz_back::dao::{
                arcade_store::mongodb::{MongoArcadeStore, MongoConfig},
                storage::StorageError,
            };
            use arcade_quiz_back::services::storage_supervisor;

            tokio::spawn(storage_supervisor::run(state, || async {
                let config = MongoConfig::from_env().await.map_err(StorageError::from)?;
                let store = MongoArcadeStore::connect(config)
                    .await
                    .map_err(StorageError::from)?;
                Ok(Arc::new(store) as Arc<dyn ArcadeStore>)
            }));
        }
        #[cfg(feature = "couch-store")]
        StorageBackend::Couch => {
            use arcade_quiz_back::dao::{
                arcade_store::couchdb::{CouchArcadeStore, CouchConfig},
                storage::StorageError,
            };
            use arcade_quiz_back::services::storage_supervisor;

            tokio::spawn(storage_supervisor::run(state, || async {
                let config = CouchConfig::from_env().map_err(StorageError::from)?;
                let store = CouchArcadeStore::connect(config)
                    .await
                    .map_err(StorageError::from)?;
                Ok(Arc::new(store) as Arc<dyn ArcadeStore>)
            }));
        }
        #[allow(unreachable_patterns)]
        other => {
            warn!(?other, "storage backend not compiled in; using in-memory storage");
            state.set_store(Arc::new(MemoryStore::new())).await;
        }
    }
}

/// Periodically drop expired rate limiting windows.
async fn sweep_rate_limiter(state: SharedState) {
    let mut ticker = interval(state.rate_limiter().window().max(Duration::from_secs(1)));
    loop {
        ticker.tick().await;
        let purged = state.rate_limiter().purge_expired();
        if purged > 0 {
            debug!(purged, "purged expired rate limit windows");
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutdown signal received");
}
