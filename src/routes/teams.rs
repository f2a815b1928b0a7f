use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::{
        ApiResponse,
        team::{CredentialCheckResponse, PlayMode, RegistrationResponse, TeamCredentials},
    },
    error::AppError,
    routes::extract::ValidJson,
    services::team_service,
    state::SharedState,
};

/// Team registration endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/teams/register", post(register_team))
        .route("/teams/validate", post(validate_team))
}

/// Register a team and open its game session.
#[utoipa::path(
    post,
    path = "/teams/register",
    tag = "teams",
    request_body = TeamCredentials,
    responses(
        (status = 200, description = "Team registered or admin access granted", body = ApiResponse<RegistrationResponse>),
        (status = 400, description = "Invalid name or access code"),
        (status = 409, description = "Team name already taken")
    )
)]
pub async fn register_team(
    State(state): State<SharedState>,
    ValidJson(payload): ValidJson<TeamCredentials>,
) -> Result<Json<ApiResponse<RegistrationResponse>>, AppError> {
    let registration = team_service::register(&state, payload).await?;
    let message = if registration.difficulty == PlayMode::Admin {
        "Admin access granted"
    } else {
        "Team registered successfully"
    };
    Ok(Json(ApiResponse::with_message(registration, message)))
}

/// Check a team name and access code without registering.
#[utoipa::path(
    post,
    path = "/teams/validate",
    tag = "teams",
    request_body = TeamCredentials,
    responses(
        (status = 200, description = "Credentials are valid", body = ApiResponse<CredentialCheckResponse>),
        (status = 400, description = "Invalid name or access code"),
        (status = 409, description = "Team name already taken")
    )
)]
pub async fn validate_team(
    State(state): State<SharedState>,
    ValidJson(payload): ValidJson<TeamCredentials>,
) -> Result<Json<ApiResponse<CredentialCheckResponse>>, AppError> {
    let check = team_service::validate(&state, payload).await?;
    let message = if check.difficulty == PlayMode::Admin {
        "Admin access code validated"
    } else {
        "Team name and access code are valid"
    };
    Ok(Json(ApiResponse::with_message(check, message)))
}
