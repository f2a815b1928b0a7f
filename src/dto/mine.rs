//! Payloads of the mine game endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::validation::validate_not_blank,
    state::{
        game::{CellAction, CellType, Difficulty, RevealResult},
        rules::{MAX_MINE_GAME_POINTS, MineGridConfig},
    },
};

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartMineRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub session_id: String,
    /// Ignored; the grid always follows the session's own difficulty.
    pub difficulty: Option<Difficulty>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartMineResponse {
    pub session_id: String,
    pub config: MineGridConfig,
    pub difficulty: Difficulty,
}

/// A single cell reveal.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MineActionRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub session_id: String,
    #[validate(range(max = 2))]
    pub cell_x: u8,
    #[validate(range(max = 2))]
    pub cell_y: u8,
    pub cell_type: CellType,
    #[serde(default)]
    pub action: CellAction,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MineActionResponse {
    pub cell_x: u8,
    pub cell_y: u8,
    pub cell_type: CellType,
    pub result: RevealResult,
    pub score_increase: u32,
    pub current_mine_score: u32,
    pub current_pro_score: u32,
    /// Mine plus pro score so far, quiz points excluded.
    pub total_score: u32,
}

/// Final mine game totals reported by the client.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompleteMineRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub session_id: String,
    #[validate(range(max = MAX_MINE_GAME_POINTS))]
    pub final_mine_score: u32,
    #[validate(range(max = MAX_MINE_GAME_POINTS))]
    pub final_pro_score: u32,
}

/// Counters derived from the recorded action log.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MineStatistics {
    pub mines_found: usize,
    pub pros_found: usize,
    pub total_actions: usize,
    pub completed_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteMineResponse {
    pub final_mine_score: u32,
    pub final_pro_score: u32,
    pub total_score: u32,
    pub quiz_score: u8,
    pub grand_total: u32,
    pub statistics: MineStatistics,
}
