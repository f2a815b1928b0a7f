use serde::Serialize;
use serde_with::skip_serializing_none;
use utoipa::ToSchema;

use crate::dto::admin::RecentSession;

/// Overall verdict of a health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Result of pinging the storage backend.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseCheck {
    pub status: HealthStatus,
    /// Round trip of the ping in milliseconds.
    pub response_time: u64,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemCheck {
    pub os: String,
    pub arch: String,
    pub rate_limited_clients: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    pub database: DatabaseCheck,
    pub system: SystemCheck,
}

/// Body of `GET /health`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: String,
    /// Process uptime in seconds.
    pub uptime: u64,
    pub environment: String,
    pub version: String,
    /// Time spent building this report, in milliseconds.
    pub response_time: u64,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionCounts {
    pub teams: usize,
    pub sessions: usize,
    pub active_sessions: usize,
    pub completed_sessions: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseDetails {
    pub status: HealthStatus,
    pub collections: CollectionCounts,
    pub recent_activity: Vec<RecentSession>,
}

/// Body of `POST /health`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetailedHealthResponse {
    pub timestamp: String,
    pub database: DatabaseDetails,
}
