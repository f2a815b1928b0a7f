use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::state::{
    game::{CellAction, CellType, Difficulty, RevealResult, SessionStatus},
    rules::{self, QUIZ_LENGTH},
};

/// Hook every storage backend runs on an entity right before writing it.
///
/// Derived fields are recomputed here so they never depend on the caller.
pub trait BeforeSave {
    fn before_save(&mut self, now: SystemTime);
}

/// Registered team with its running totals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamEntity {
    /// Stable identifier for the team.
    pub id: Uuid,
    /// Display name as entered (trimmed).
    pub team_name: String,
    /// Lower-cased name backing case-insensitive uniqueness.
    pub name_key: String,
    pub access_code: String,
    pub difficulty: Difficulty,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
    pub is_active: bool,
    pub game_completed: bool,
    /// Verified count of correct quiz responses.
    pub questions_correct: u8,
    pub total_questions: u8,
    pub quiz_score: u8,
    pub mine_score: u32,
    pub pro_score: u32,
    /// Grand total stamped on mine game completion.
    pub total_score: u32,
    pub completed_at: Option<SystemTime>,
}

impl TeamEntity {
    pub fn new(
        team_name: &str,
        access_code: &str,
        difficulty: Difficulty,
        now: SystemTime,
    ) -> Self {
        let team_name = team_name.trim().to_owned();
        Self {
            id: Uuid::new_v4(),
            name_key: Self::name_key(&team_name),
            team_name,
            access_code: access_code.to_owned(),
            difficulty,
            created_at: now,
            updated_at: now,
            is_active: true,
            game_completed: false,
            questions_correct: 0,
            total_questions: QUIZ_LENGTH,
            quiz_score: 0,
            mine_score: 0,
            pro_score: 0,
            total_score: 0,
            completed_at: None,
        }
    }

    /// Normalised key used to compare team names ignoring case.
    pub fn name_key(name: &str) -> String {
        name.trim().to_lowercase()
    }
}

impl BeforeSave for TeamEntity {
    fn before_save(&mut self, now: SystemTime) {
        self.name_key = Self::name_key(&self.team_name);
        self.updated_at = now;
    }
}

/// Progress of one registration through the quiz and the mine game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameSessionEntity {
    /// Opaque public identifier (`<unix-millis>-<suffix>`).
    pub session_id: String,
    pub team_id: Uuid,
    /// Copied from the team at registration.
    pub difficulty: Difficulty,
    pub status: SessionStatus,
    pub started_at: SystemTime,
    pub completed_at: Option<SystemTime>,
    pub quiz_score: u8,
    pub mine_score: u32,
    pub pro_score: u32,
    /// Always `quiz_score * 10 + mine_score + pro_score` once saved.
    pub total_score: u32,
    pub can_play_mine: bool,
}

impl GameSessionEntity {
    pub fn new(session_id: String, team_id: Uuid, difficulty: Difficulty, now: SystemTime) -> Self {
        Self {
            session_id,
            team_id,
            difficulty,
            status: SessionStatus::Active,
            started_at: now,
            completed_at: None,
            quiz_score: 0,
            mine_score: 0,
            pro_score: 0,
            total_score: 0,
            can_play_mine: false,
        }
    }
}

impl BeforeSave for GameSessionEntity {
    fn before_save(&mut self, _now: SystemTime) {
        self.total_score = rules::grand_total(self.quiz_score, self.mine_score, self.pro_score);
    }
}

/// Question of the admin-editable bank.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizQuestionEntity {
    pub id: Uuid,
    pub difficulty: Difficulty,
    /// Slot 1..=8 within the difficulty.
    pub question_id: u8,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: u8,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl QuizQuestionEntity {
    pub fn new(
        difficulty: Difficulty,
        question_id: u8,
        question: String,
        options: Vec<String>,
        correct_answer: u8,
        now: SystemTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            difficulty,
            question_id,
            question,
            options,
            correct_answer,
            created_at: now,
            updated_at: now,
        }
    }
}

impl BeforeSave for QuizQuestionEntity {
    fn before_save(&mut self, now: SystemTime) {
        self.updated_at = now;
    }
}

/// Recorded answer for one question of a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizResponseEntity {
    pub session_id: String,
    pub question_id: u8,
    pub question: String,
    pub options: Vec<String>,
    pub selected_answer: u8,
    pub correct_answer: u8,
    pub is_correct: bool,
    pub answered_at: SystemTime,
}

impl BeforeSave for QuizResponseEntity {
    fn before_save(&mut self, _now: SystemTime) {
        self.is_correct = self.selected_answer == self.correct_answer;
    }
}

/// One entry of the append-only mine game log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MineActionEntity {
    pub id: Uuid,
    pub session_id: String,
    pub cell_x: u8,
    pub cell_y: u8,
    pub cell_type: CellType,
    pub action: CellAction,
    pub result: RevealResult,
    pub action_at: SystemTime,
}

impl BeforeSave for MineActionEntity {
    fn before_save(&mut self, _now: SystemTime) {
        self.result = rules::score_cell(self.cell_type).result;
    }
}

/// Quiz time limits per difficulty, in seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimerSettingsEntity {
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
    pub updated_at: SystemTime,
}

impl TimerSettingsEntity {
    /// Same limit for every difficulty.
    pub fn uniform(seconds: u32, now: SystemTime) -> Self {
        Self {
            easy: seconds,
            medium: seconds,
            hard: seconds,
            updated_at: now,
        }
    }

    pub fn for_difficulty(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }
}

impl BeforeSave for TimerSettingsEntity {
    fn before_save(&mut self, now: SystemTime) {
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_hook_recomputes_total() {
        let now = SystemTime::now();
        let mut session =
            GameSessionEntity::new("1-abc".into(), Uuid::new_v4(), Difficulty::Easy, now);
        session.quiz_score = 7;
        session.mine_score = 200;
        session.pro_score = 200;
        session.total_score = 9_999;
        session.before_save(now);
        assert_eq!(session.total_score, 470);
    }

    #[test]
    fn response_hook_ignores_client_correctness() {
        let mut response = QuizResponseEntity {
            session_id: "s".into(),
            question_id: 1,
            question: "q".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            selected_answer: 2,
            correct_answer: 1,
            is_correct: true,
            answered_at: SystemTime::now(),
        };
        response.before_save(SystemTime::now());
        assert!(!response.is_correct);
        response.selected_answer = 1;
        response.before_save(SystemTime::now());
        assert!(response.is_correct);
    }

    #[test]
    fn team_name_key_is_trimmed_lowercase() {
        let team = TeamEntity::new("  Alpha Squad ", "EASY123", Difficulty::Easy, SystemTime::now());
        assert_eq!(team.team_name, "Alpha Squad");
        assert_eq!(team.name_key, "alpha squad");
        assert_eq!(team.total_questions, 8);
    }
}
