use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Difficulty tier a team plays at, derived from its access code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Every tier in presentation order.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a difficulty tier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown difficulty `{0}`")]
pub struct UnknownDifficulty(pub String);

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(UnknownDifficulty(other.to_owned())),
        }
    }
}

/// Progress marker of a game session. Only moves forward, see [`crate::state::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Registered, quiz in progress.
    Active,
    /// Quiz submitted; eligibility for the mine game is fixed.
    QuizCompleted,
    /// Mine game submitted with final scores.
    MineCompleted,
    /// Terminal state.
    Finished,
}

impl SessionStatus {
    /// Whether the quiz has been submitted for a session in this status.
    pub fn quiz_done(&self) -> bool {
        !matches!(self, SessionStatus::Active)
    }

    /// Whether the mine game has been submitted for a session in this status.
    pub fn mine_done(&self) -> bool {
        matches!(self, SessionStatus::MineCompleted | SessionStatus::Finished)
    }
}

/// Content of a cell in the 3×3 mine grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Mine,
    Pro,
    Blank,
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CellType::Mine => "mine",
            CellType::Pro => "pro",
            CellType::Blank => "blank",
        })
    }
}

/// What the player did with a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CellAction {
    #[default]
    Reveal,
    Flag,
}

/// Outcome recorded for a mine game action, derived from the cell type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RevealResult {
    Hit,
    Miss,
    ProFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parses_lowercase_names_only() {
        assert_eq!("easy".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert_eq!("hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("Easy".parse::<Difficulty>().is_err());
        assert!("admin".parse::<Difficulty>().is_err());
    }

    #[test]
    fn status_serializes_in_snake_case() {
        let json = serde_json::to_string(&SessionStatus::QuizCompleted).unwrap();
        assert_eq!(json, "\"quiz_completed\"");
        let back: RevealResult = serde_json::from_str("\"pro_found\"").unwrap();
        assert_eq!(back, RevealResult::ProFound);
    }
}
