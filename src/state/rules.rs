//! Scoring and eligibility rules shared by the quiz and mine game services.

use serde::Serialize;
use utoipa::ToSchema;

use crate::state::game::{CellType, Difficulty, RevealResult};

/// Number of questions in a quiz round.
pub const QUIZ_LENGTH: u8 = 8;
/// Points each correct quiz answer is worth in the grand total.
pub const QUIZ_POINTS_PER_CORRECT: u32 = 10;
/// Points awarded for revealing a mine.
pub const MINE_POINTS: u32 = 100;
/// Points awarded for revealing a pro cell.
pub const PRO_POINTS: u32 = 200;
/// Cells on the 3×3 mine grid.
pub const GRID_CELLS: u32 = 9;
/// Upper bound accepted for a reported mine or pro total: every cell a pro.
pub const MAX_MINE_GAME_POINTS: u32 = GRID_CELLS * PRO_POINTS;

/// Minimum quiz score needed to unlock the mine game for a difficulty.
pub fn mine_threshold(difficulty: Difficulty) -> u8 {
    match difficulty {
        Difficulty::Easy => 6,
        Difficulty::Medium => 5,
        Difficulty::Hard => 4,
    }
}

/// Eligibility gate evaluated once when the quiz is completed.
pub fn can_play_mine(score: u8, difficulty: Difficulty) -> bool {
    score >= mine_threshold(difficulty)
}

/// `quizScore*10 + mineScore + proScore`, saturating at `u32::MAX`.
pub fn grand_total(quiz_score: u8, mine_score: u32, pro_score: u32) -> u32 {
    (u32::from(quiz_score) * QUIZ_POINTS_PER_CORRECT)
        .saturating_add(mine_score)
        .saturating_add(pro_score)
}

/// Layout of the mine grid handed to the client when the game starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct MineGridConfig {
    /// Reveals the player may make.
    pub attempts: u8,
    /// Cells worth [`MINE_POINTS`].
    pub mines: u8,
    /// Cells worth [`PRO_POINTS`].
    pub pros: u8,
    /// Cells worth nothing.
    pub blanks: u8,
}

impl MineGridConfig {
    /// Grid handed out for `difficulty`: fewer mines and more attempts as it gets harder.
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                attempts: 2,
                mines: 5,
                pros: 2,
                blanks: 2,
            },
            Difficulty::Medium => Self {
                attempts: 3,
                mines: 4,
                pros: 3,
                blanks: 2,
            },
            Difficulty::Hard => Self {
                attempts: 4,
                mines: 3,
                pros: 4,
                blanks: 2,
            },
        }
    }

    /// Total number of cells described by the configuration.
    pub fn cells(&self) -> u8 {
        self.mines + self.pros + self.blanks
    }
}

/// Score contribution and recorded result of revealing a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellOutcome {
    /// Result stored on the action log.
    pub result: RevealResult,
    /// Points added to the mine score.
    pub mine_points: u32,
    /// Points added to the pro score.
    pub pro_points: u32,
}

impl CellOutcome {
    /// Points gained by the reveal.
    pub fn score_increase(&self) -> u32 {
        self.mine_points + self.pro_points
    }
}

/// Score a single reveal by cell type.
pub fn score_cell(cell: CellType) -> CellOutcome {
    match cell {
        CellType::Mine => CellOutcome {
            result: RevealResult::Hit,
            mine_points: MINE_POINTS,
            pro_points: 0,
        },
        CellType::Pro => CellOutcome {
            result: RevealResult::ProFound,
            mine_points: 0,
            pro_points: PRO_POINTS,
        },
        CellType::Blank => CellOutcome {
            result: RevealResult::Miss,
            mine_points: 0,
            pro_points: 0,
        },
    }
}

/// Percentage `part / whole * 100`, zero when `whole` is zero.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eligibility_matches_threshold_table_for_every_score() {
        for difficulty in Difficulty::ALL {
            let threshold = match difficulty {
                Difficulty::Easy => 6,
                Difficulty::Medium => 5,
                Difficulty::Hard => 4,
            };
            for score in 0..=QUIZ_LENGTH {
                assert_eq!(
                    can_play_mine(score, difficulty),
                    score >= threshold,
                    "score {score} at {difficulty}"
                );
            }
        }
    }

    #[test]
    fn grid_configs_fill_the_three_by_three_board() {
        for difficulty in Difficulty::ALL {
            assert_eq!(MineGridConfig::for_difficulty(difficulty).cells(), 9);
        }
        assert_eq!(MineGridConfig::for_difficulty(Difficulty::Medium).attempts, 3);
    }

    #[test]
    fn cells_score_by_type() {
        assert_eq!(score_cell(CellType::Mine).score_increase(), 100);
        assert_eq!(score_cell(CellType::Mine).result, RevealResult::Hit);
        assert_eq!(score_cell(CellType::Pro).pro_points, 200);
        assert_eq!(score_cell(CellType::Pro).result, RevealResult::ProFound);
        assert_eq!(score_cell(CellType::Blank).score_increase(), 0);
        assert_eq!(score_cell(CellType::Blank).result, RevealResult::Miss);
    }

    #[test]
    fn grand_total_weights_quiz_answers() {
        assert_eq!(grand_total(7, 200, 200), 470);
        assert_eq!(grand_total(0, 0, 0), 0);
    }

    #[test]
    fn grand_total_saturates_instead_of_overflowing() {
        assert_eq!(grand_total(8, u32::MAX, 0), u32::MAX);
        assert_eq!(grand_total(8, u32::MAX - 10, u32::MAX), u32::MAX);
        assert_eq!(MAX_MINE_GAME_POINTS, 1_800);
    }

    #[test]
    fn percentage_handles_empty_denominator() {
        assert_eq!(percentage(3, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
        assert_eq!(round2(2.0 / 3.0), 0.67);
    }
}
