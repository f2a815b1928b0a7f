//! Payloads of the quiz endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    dao::models::QuizQuestionEntity,
    dto::validation::{validate_not_blank, validate_options},
    state::game::Difficulty,
};

/// Query of `GET /quiz/questions`. The difficulty is parsed by the service so an
/// unknown value yields `INVALID_DIFFICULTY` rather than a generic query error.
#[derive(Debug, Deserialize, IntoParams, Validate)]
pub struct QuestionsQuery {
    pub difficulty: Option<String>,
}

/// Question as shown to a player.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuizQuestionView {
    /// Slot of the question within its difficulty (1..=8).
    pub id: u8,
    pub question: String,
    pub options: Vec<String>,
    /// Index of the correct option.
    pub correct: u8,
}

impl From<QuizQuestionEntity> for QuizQuestionView {
    fn from(entity: QuizQuestionEntity) -> Self {
        Self {
            id: entity.question_id,
            question: entity.question,
            options: entity.options,
            correct: entity.correct_answer,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionsResponse {
    pub questions: Vec<QuizQuestionView>,
    pub difficulty: Difficulty,
    pub total_questions: usize,
    pub time_limit_seconds: u32,
}

/// One answer of a running quiz.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub session_id: String,
    #[validate(range(min = 1, max = 8))]
    pub question_id: u8,
    #[validate(custom(function = "validate_not_blank"))]
    pub question: String,
    #[validate(custom(function = "validate_options"))]
    pub options: Vec<String>,
    #[validate(range(max = 3))]
    pub selected_answer: u8,
    #[validate(range(max = 3))]
    pub correct_answer: u8,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerResponse {
    pub question_id: u8,
    /// Correctness computed from the stored answer indices.
    pub is_correct: bool,
}

/// Final quiz tally reported by the client.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompleteQuizRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub session_id: String,
    #[validate(range(max = 8))]
    pub score: u8,
    #[validate(range(min = 1, max = 8))]
    pub total_questions: u8,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteQuizResponse {
    pub score: u8,
    pub total_questions: u8,
    pub can_play_mine: bool,
    pub difficulty: Difficulty,
    /// Number of stored responses marked correct.
    pub verified_score: usize,
    /// Score needed at this difficulty to unlock the mine game.
    pub requirement: u8,
}
