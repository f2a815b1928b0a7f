use std::time::{Instant, SystemTime};

use tracing::warn;

use crate::{
    dto::{
        format_system_time,
        health::{
            CollectionCounts, DatabaseCheck, DatabaseDetails, DetailedHealthResponse,
            HealthChecks, HealthResponse, HealthStatus, SystemCheck,
        },
    },
    error::ServiceError,
    services::analytics_service::{Snapshot, recent_sessions},
    state::SharedState,
};

const DETAILED_RECENT_ACTIVITY: usize = 5;

fn elapsed_millis(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

async fn database_check(state: &SharedState) -> DatabaseCheck {
    let started = Instant::now();
    let outcome = match state.require_store().await {
        Ok(store) => store.health_check().await.map_err(|err| err.to_string()),
        Err(err) => Err(err.to_string()),
    };

    match outcome {
        Ok(()) => DatabaseCheck {
            status: HealthStatus::Healthy,
            response_time: elapsed_millis(started),
            error: None,
        },
        Err(error) => {
            warn!(%error, "storage health check failed");
            DatabaseCheck {
                status: HealthStatus::Degraded,
                response_time: elapsed_millis(started),
                error: Some(error),
            }
        }
    }
}

/// Ping the store and describe the process. Degraded whenever the store is
/// unreachable or the supervisor has flagged degraded mode.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let started = Instant::now();
    let database = database_check(state).await;

    let status = if database.status == HealthStatus::Healthy && !state.is_degraded().await {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    HealthResponse {
        status,
        timestamp: format_system_time(SystemTime::now()),
        uptime: state.uptime().as_secs(),
        environment: if state.config().development {
            "development".into()
        } else {
            "production".into()
        },
        version: env!("CARGO_PKG_VERSION").into(),
        response_time: elapsed_millis(started),
        checks: HealthChecks {
            database,
            system: SystemCheck {
                os: std::env::consts::OS.into(),
                arch: std::env::consts::ARCH.into(),
                rate_limited_clients: state.rate_limiter().tracked_clients(),
            },
        },
    }
}

/// Collection counts and the latest sessions.
pub async fn detailed_status(state: &SharedState) -> Result<DetailedHealthResponse, ServiceError> {
    let store = state.require_store().await?;
    let snapshot = match Snapshot::load(store.as_ref()).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            warn!(error = %err, "detailed health check failed");
            return Err(ServiceError::Degraded);
        }
    };

    let active_sessions = snapshot
        .sessions
        .iter()
        .filter(|session| !session.status.quiz_done())
        .count();
    let completed_sessions = snapshot
        .sessions
        .iter()
        .filter(|session| session.status.mine_done())
        .count();

    Ok(DetailedHealthResponse {
        timestamp: format_system_time(SystemTime::now()),
        database: DatabaseDetails {
            status: HealthStatus::Healthy,
            collections: CollectionCounts {
                teams: snapshot.teams.len(),
                sessions: snapshot.sessions.len(),
                active_sessions,
                completed_sessions,
            },
            recent_activity: recent_sessions(&snapshot, DETAILED_RECENT_ACTIVITY),
        },
    })
}
