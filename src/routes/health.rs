use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use crate::{
    dto::{
        ApiResponse,
        health::{DetailedHealthResponse, HealthResponse, HealthStatus},
    },
    error::AppError,
    services::health_service,
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = ApiResponse<HealthResponse>),
        (status = 503, description = "Storage unreachable", body = ApiResponse<HealthResponse>)
    )
)]
/// Report process health and ping the storage backend.
pub async fn healthcheck(
    State(state): State<SharedState>,
) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    let report = health_service::health_status(&state).await;
    let healthy = report.status == HealthStatus::Healthy;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let mut body = ApiResponse::ok(report);
    body.success = healthy;
    (status, Json(body))
}

#[utoipa::path(
    post,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Collection counts and recent sessions", body = ApiResponse<DetailedHealthResponse>),
        (status = 503, description = "Storage unreachable")
    )
)]
/// Detailed storage report.
pub async fn detailed_healthcheck(
    State(state): State<SharedState>,
) -> Result<Json<ApiResponse<DetailedHealthResponse>>, AppError> {
    let report = health_service::detailed_status(&state).await?;
    Ok(Json(ApiResponse::ok(report)))
}

/// Configure the health routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/health", get(healthcheck).post(detailed_healthcheck))
}
