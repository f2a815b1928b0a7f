use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::{
        ApiResponse,
        mine::{
            CompleteMineRequest, CompleteMineResponse, MineActionRequest, MineActionResponse,
            StartMineRequest, StartMineResponse,
        },
    },
    error::AppError,
    routes::extract::ValidJson,
    services::mine_service,
    state::SharedState,
};

/// Mine game endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/mine-game/start", post(start_mine_game))
        .route("/mine-game/action", post(reveal_cell))
        .route("/mine-game/complete", post(complete_mine_game))
}

/// Grid layout for an eligible session.
#[utoipa::path(
    post,
    path = "/mine-game/start",
    tag = "mine-game",
    request_body = StartMineRequest,
    responses(
        (status = 200, description = "Mine game started", body = ApiResponse<StartMineResponse>),
        (status = 403, description = "Quiz score too low"),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn start_mine_game(
    State(state): State<SharedState>,
    ValidJson(payload): ValidJson<StartMineRequest>,
) -> Result<Json<ApiResponse<StartMineResponse>>, AppError> {
    let started = mine_service::start(&state, payload).await?;
    Ok(Json(ApiResponse::with_message(
        started,
        "Mine game started successfully",
    )))
}

/// Reveal one cell.
#[utoipa::path(
    post,
    path = "/mine-game/action",
    tag = "mine-game",
    request_body = MineActionRequest,
    responses(
        (status = 200, description = "Cell scored", body = ApiResponse<MineActionResponse>),
        (status = 403, description = "Quiz score too low"),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Mine game already completed")
    )
)]
pub async fn reveal_cell(
    State(state): State<SharedState>,
    ValidJson(payload): ValidJson<MineActionRequest>,
) -> Result<Json<ApiResponse<MineActionResponse>>, AppError> {
    let revealed = mine_service::reveal(&state, payload).await?;
    let message = format!("Cell revealed: {}", revealed.cell_type);
    Ok(Json(ApiResponse::with_message(revealed, message)))
}

/// Record final scores and close the session's game.
#[utoipa::path(
    post,
    path = "/mine-game/complete",
    tag = "mine-game",
    request_body = CompleteMineRequest,
    responses(
        (status = 200, description = "Mine game completed", body = ApiResponse<CompleteMineResponse>),
        (status = 403, description = "Quiz score too low"),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Session not waiting for mine game results")
    )
)]
pub async fn complete_mine_game(
    State(state): State<SharedState>,
    ValidJson(payload): ValidJson<CompleteMineRequest>,
) -> Result<Json<ApiResponse<CompleteMineResponse>>, AppError> {
    let completed = mine_service::complete(&state, payload).await?;
    Ok(Json(ApiResponse::with_message(
        completed,
        "Mine game completed successfully",
    )))
}
