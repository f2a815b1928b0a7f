use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{MongoDaoError, MongoResult};
use crate::{
    dao::models::{
        GameSessionEntity, MineActionEntity, QuizQuestionEntity, QuizResponseEntity, TeamEntity,
        TimerSettingsEntity,
    },
    state::game::{CellAction, CellType, Difficulty, RevealResult, SessionStatus},
};

pub const TEAMS: &str = "teams";
pub const SESSIONS: &str = "gamesessions";
pub const QUESTIONS: &str = "quizquestions";
pub const RESPONSES: &str = "quizresponses";
pub const ACTIONS: &str = "minegameactions";
pub const SETTINGS: &str = "settings";
pub const TIMER_SETTINGS_ID: &str = "timers";

fn parse_uuid(collection: &'static str, id: &str) -> MongoResult<Uuid> {
    Uuid::parse_str(id).map_err(|source| MongoDaoError::InvalidDocument {
        collection,
        id: id.to_owned(),
        source,
    })
}

fn to_bson_time(value: std::time::SystemTime) -> DateTime {
    DateTime::from_system_time(value)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoTeamDocument {
    #[serde(rename = "_id")]
    id: String,
    team_name: String,
    name_key: String,
    access_code: String,
    difficulty: Difficulty,
    created_at: DateTime,
    updated_at: DateTime,
    is_active: bool,
    game_completed: bool,
    questions_correct: u8,
    total_questions: u8,
    quiz_score: u8,
    mine_score: u32,
    pro_score: u32,
    total_score: u32,
    completed_at: Option<DateTime>,
}

impl From<TeamEntity> for MongoTeamDocument {
    fn from(value: TeamEntity) -> Self {
        Self {
            id: value.id.to_string(),
            team_name: value.team_name,
            name_key: value.name_key,
            access_code: value.access_code,
            difficulty: value.difficulty,
            created_at: to_bson_time(value.created_at),
            updated_at: to_bson_time(value.updated_at),
            is_active: value.is_active,
            game_completed: value.game_completed,
            questions_correct: value.questions_correct,
            total_questions: value.total_questions,
            quiz_score: value.quiz_score,
            mine_score: value.mine_score,
            pro_score: value.pro_score,
            total_score: value.total_score,
            completed_at: value.completed_at.map(to_bson_time),
        }
    }
}

impl TryFrom<MongoTeamDocument> for TeamEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoTeamDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_uuid(TEAMS, &value.id)?,
            team_name: value.team_name,
            name_key: value.name_key,
            access_code: value.access_code,
            difficulty: value.difficulty,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
            is_active: value.is_active,
            game_completed: value.game_completed,
            questions_correct: value.questions_correct,
            total_questions: value.total_questions,
            quiz_score: value.quiz_score,
            mine_score: value.mine_score,
            pro_score: value.pro_score,
            total_score: value.total_score,
            completed_at: value.completed_at.map(|at| at.to_system_time()),
        })
    }
}

/// Sessions are keyed by their public session id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoSessionDocument {
    #[serde(rename = "_id")]
    session_id: String,
    team_id: String,
    difficulty: Difficulty,
    status: SessionStatus,
    started_at: DateTime,
    completed_at: Option<DateTime>,
    quiz_score: u8,
    mine_score: u32,
    pro_score: u32,
    total_score: u32,
    can_play_mine: bool,
}

impl From<GameSessionEntity> for MongoSessionDocument {
    fn from(value: GameSessionEntity) -> Self {
        Self {
            session_id: value.session_id,
            team_id: value.team_id.to_string(),
            difficulty: value.difficulty,
            status: value.status,
            started_at: to_bson_time(value.started_at),
            completed_at: value.completed_at.map(to_bson_time),
            quiz_score: value.quiz_score,
            mine_score: value.mine_score,
            pro_score: value.pro_score,
            total_score: value.total_score,
            can_play_mine: value.can_play_mine,
        }
    }
}

impl TryFrom<MongoSessionDocument> for GameSessionEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoSessionDocument) -> MongoResult<Self> {
        Ok(Self {
            team_id: parse_uuid(SESSIONS, &value.team_id)?,
            session_id: value.session_id,
            difficulty: value.difficulty,
            status: value.status,
            started_at: value.started_at.to_system_time(),
            completed_at: value.completed_at.map(|at| at.to_system_time()),
            quiz_score: value.quiz_score,
            mine_score: value.mine_score,
            pro_score: value.pro_score,
            total_score: value.total_score,
            can_play_mine: value.can_play_mine,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoQuestionDocument {
    #[serde(rename = "_id")]
    id: String,
    difficulty: Difficulty,
    question_id: u8,
    question: String,
    options: Vec<String>,
    correct_answer: u8,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<QuizQuestionEntity> for MongoQuestionDocument {
    fn from(value: QuizQuestionEntity) -> Self {
        Self {
            id: value.id.to_string(),
            difficulty: value.difficulty,
            question_id: value.question_id,
            question: value.question,
            options: value.options,
            correct_answer: value.correct_answer,
            created_at: to_bson_time(value.created_at),
            updated_at: to_bson_time(value.updated_at),
        }
    }
}

impl TryFrom<MongoQuestionDocument> for QuizQuestionEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoQuestionDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_uuid(QUESTIONS, &value.id)?,
            difficulty: value.difficulty,
            question_id: value.question_id,
            question: value.question,
            options: value.options,
            correct_answer: value.correct_answer,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoResponseDocument {
    session_id: String,
    question_id: u8,
    question: String,
    options: Vec<String>,
    selected_answer: u8,
    correct_answer: u8,
    is_correct: bool,
    answered_at: DateTime,
}

impl From<QuizResponseEntity> for MongoResponseDocument {
    fn from(value: QuizResponseEntity) -> Self {
        Self {
            session_id: value.session_id,
            question_id: value.question_id,
            question: value.question,
            options: value.options,
            selected_answer: value.selected_answer,
            correct_answer: value.correct_answer,
            is_correct: value.is_correct,
            answered_at: to_bson_time(value.answered_at),
        }
    }
}

impl From<MongoResponseDocument> for QuizResponseEntity {
    fn from(value: MongoResponseDocument) -> Self {
        Self {
            session_id: value.session_id,
            question_id: value.question_id,
            question: value.question,
            options: value.options,
            selected_answer: value.selected_answer,
            correct_answer: value.correct_answer,
            is_correct: value.is_correct,
            answered_at: value.answered_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoActionDocument {
    #[serde(rename = "_id")]
    id: String,
    session_id: String,
    cell_x: u8,
    cell_y: u8,
    cell_type: CellType,
    action: CellAction,
    result: RevealResult,
    action_at: DateTime,
}

impl From<MineActionEntity> for MongoActionDocument {
    fn from(value: MineActionEntity) -> Self {
        Self {
            id: value.id.to_string(),
            session_id: value.session_id,
            cell_x: value.cell_x,
            cell_y: value.cell_y,
            cell_type: value.cell_type,
            action: value.action,
            result: value.result,
            action_at: to_bson_time(value.action_at),
        }
    }
}

impl TryFrom<MongoActionDocument> for MineActionEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoActionDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_uuid(ACTIONS, &value.id)?,
            session_id: value.session_id,
            cell_x: value.cell_x,
            cell_y: value.cell_y,
            cell_type: value.cell_type,
            action: value.action,
            result: value.result,
            action_at: value.action_at.to_system_time(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoTimerSettingsDocument {
    #[serde(rename = "_id")]
    id: String,
    easy: u32,
    medium: u32,
    hard: u32,
    updated_at: DateTime,
}

impl From<TimerSettingsEntity> for MongoTimerSettingsDocument {
    fn from(value: TimerSettingsEntity) -> Self {
        Self {
            id: TIMER_SETTINGS_ID.to_owned(),
            easy: value.easy,
            medium: value.medium,
            hard: value.hard,
            updated_at: to_bson_time(value.updated_at),
        }
    }
}

impl From<MongoTimerSettingsDocument> for TimerSettingsEntity {
    fn from(value: MongoTimerSettingsDocument) -> Self {
        Self {
            easy: value.easy,
            medium: value.medium,
            hard: value.hard,
            updated_at: value.updated_at.to_system_time(),
        }
    }
}
