//! DTO definitions used by the admin REST API and documentation layer.

use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{QuizQuestionEntity, TeamEntity, TimerSettingsEntity},
    dto::{
        format_system_time,
        validation::{validate_not_blank, validate_options},
    },
    state::game::{Difficulty, SessionStatus},
};

/// Optional difficulty filter; unknown values are ignored by the admin listings.
#[derive(Debug, Deserialize, IntoParams, Validate)]
pub struct DifficultyFilter {
    pub difficulty: Option<String>,
}

/// Full projection of a stored question.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: Uuid,
    pub difficulty: Difficulty,
    pub question_id: u8,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: u8,
    pub created_at: String,
    pub updated_at: String,
}

impl From<QuizQuestionEntity> for QuestionView {
    fn from(entity: QuizQuestionEntity) -> Self {
        Self {
            id: entity.id,
            difficulty: entity.difficulty,
            question_id: entity.question_id,
            question: entity.question,
            options: entity.options,
            correct_answer: entity.correct_answer,
            created_at: format_system_time(entity.created_at),
            updated_at: format_system_time(entity.updated_at),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionListResponse {
    pub questions: Vec<QuestionView>,
    pub total: usize,
}

/// New question for a free (difficulty, slot) pair.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    pub difficulty: Difficulty,
    #[validate(range(min = 1, max = 8))]
    pub question_id: u8,
    #[validate(custom(function = "validate_not_blank"))]
    pub question: String,
    #[validate(custom(function = "validate_options"))]
    pub options: Vec<String>,
    #[validate(range(max = 3))]
    pub correct_answer: u8,
}

/// Partial update of a stored question. Absent fields keep their value.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionRequest {
    #[serde(alias = "_id")]
    pub id: Uuid,
    pub difficulty: Option<Difficulty>,
    #[validate(range(min = 1, max = 8))]
    pub question_id: Option<u8>,
    #[validate(custom(function = "validate_not_blank"))]
    pub question: Option<String>,
    #[validate(custom(function = "validate_options"))]
    pub options: Option<Vec<String>>,
    #[validate(range(max = 3))]
    pub correct_answer: Option<u8>,
}

/// Query of `DELETE /admin/questions`. Kept as a string so a missing or
/// malformed id gets its own error code.
#[derive(Debug, Deserialize, IntoParams, Validate)]
pub struct DeleteQuestionQuery {
    pub id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedQuestionResponse {
    pub id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct GenerateQuestionsRequest {
    pub difficulty: Difficulty,
}

/// Template question proposed to the admin; nothing is persisted.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    pub question_id: u8,
    pub difficulty: Difficulty,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: u8,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GeneratedQuestionsResponse {
    pub difficulty: Difficulty,
    pub questions: Vec<GeneratedQuestion>,
}

/// Quiz time limit per difficulty, in seconds.
#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimerSettingsView {
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
    pub updated_at: Option<String>,
}

impl TimerSettingsView {
    pub fn from_entity(entity: TimerSettingsEntity, persisted: bool) -> Self {
        Self {
            easy: entity.easy,
            medium: entity.medium,
            hard: entity.hard,
            updated_at: persisted.then(|| format_system_time(entity.updated_at)),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateTimersRequest {
    #[validate(range(min = 30, max = 3600))]
    pub easy: u32,
    #[validate(range(min = 30, max = 3600))]
    pub medium: u32,
    #[validate(range(min = 30, max = 3600))]
    pub hard: u32,
}

/// Human readable progress label of a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum TeamProgress {
    #[serde(rename = "Completed")]
    Completed,
    #[serde(rename = "In Progress")]
    InProgress,
}

/// Team as listed on the admin dashboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamView {
    pub id: Uuid,
    pub team_name: String,
    pub difficulty: Difficulty,
    pub access_code: String,
    pub questions_correct: u8,
    pub total_questions: u8,
    pub quiz_score: u8,
    pub mine_score: u32,
    pub pro_score: u32,
    pub total_score: u32,
    pub game_completed: bool,
    pub registered_at: String,
    pub completed_at: Option<String>,
    /// Percentage of correct answers, rounded to an integer.
    pub quiz_accuracy: u32,
    pub status: TeamProgress,
}

impl From<TeamEntity> for TeamView {
    fn from(team: TeamEntity) -> Self {
        let quiz_accuracy = if team.total_questions == 0 {
            0
        } else {
            (f64::from(team.questions_correct) / f64::from(team.total_questions) * 100.0).round()
                as u32
        };
        let status = if team.game_completed {
            TeamProgress::Completed
        } else {
            TeamProgress::InProgress
        };

        Self {
            id: team.id,
            team_name: team.team_name,
            difficulty: team.difficulty,
            access_code: team.access_code,
            questions_correct: team.questions_correct,
            total_questions: team.total_questions,
            quiz_score: team.quiz_score,
            mine_score: team.mine_score,
            pro_score: team.pro_score,
            total_score: team.total_score,
            game_completed: team.game_completed,
            registered_at: format_system_time(team.created_at),
            completed_at: team.completed_at.map(format_system_time),
            quiz_accuracy,
            status,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamsOverview {
    pub total_teams: usize,
    pub completed_teams: usize,
    pub in_progress_teams: usize,
    pub teams: Vec<TeamView>,
    pub completed_only: Vec<TeamView>,
    pub in_progress_only: Vec<TeamView>,
}

/// Lookup of a single team by name or id.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TeamLookupRequest {
    pub team_name: Option<String>,
    pub team_id: Option<String>,
}

/// Numeric column the leaderboard is ordered by (descending).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum LeaderboardSort {
    #[default]
    TotalScore,
    GrandTotal,
    QuizScore,
    MineScore,
    ProScore,
    QuizAccuracy,
    MineSuccessRate,
}

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardQuery {
    pub difficulty: Option<String>,
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<usize>,
    pub sort_by: Option<LeaderboardSort>,
}

/// One session joined with its team and logs.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub team_name: String,
    pub difficulty: Difficulty,
    pub session_id: String,
    pub status: SessionStatus,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub quiz_score: u8,
    pub mine_score: u32,
    pub pro_score: u32,
    pub total_score: u32,
    pub grand_total: u32,
    pub can_play_mine: bool,
    pub correct_answers: usize,
    pub total_questions: usize,
    pub quiz_accuracy: f64,
    pub mines_found: usize,
    pub pros_found: usize,
    pub total_mine_actions: usize,
    pub mine_success_rate: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardSummary {
    pub total_teams: usize,
    pub total_sessions: usize,
    pub completed_sessions: usize,
    pub completion_rate: f64,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardFilters {
    pub difficulty: Option<Difficulty>,
    pub sort_by: LeaderboardSort,
    pub limit: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardRow>,
    pub summary: LeaderboardSummary,
    pub filters: LeaderboardFilters,
}

/// Reporting window of the analytics endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TimeRange {
    #[serde(rename = "1h")]
    LastHour,
    #[default]
    #[serde(rename = "24h")]
    LastDay,
    #[serde(rename = "7d")]
    LastWeek,
    #[serde(rename = "30d")]
    LastMonth,
    #[serde(rename = "all")]
    All,
}

impl TimeRange {
    /// Length of the window, `None` meaning unbounded.
    pub fn window(&self) -> Option<Duration> {
        const HOUR: u64 = 60 * 60;
        match self {
            TimeRange::LastHour => Some(Duration::from_secs(HOUR)),
            TimeRange::LastDay => Some(Duration::from_secs(24 * HOUR)),
            TimeRange::LastWeek => Some(Duration::from_secs(7 * 24 * HOUR)),
            TimeRange::LastMonth => Some(Duration::from_secs(30 * 24 * HOUR)),
            TimeRange::All => None,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub time_range: Option<TimeRange>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsOverview {
    pub total_teams: usize,
    pub total_sessions: usize,
    pub completed_quizzes: usize,
    pub completed_mine_games: usize,
    pub quiz_completion_rate: f64,
    pub mine_game_completion_rate: f64,
}

/// Answer accuracy of one question slot.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAccuracy {
    pub question_id: u8,
    pub difficulty: Difficulty,
    pub question: String,
    pub total_answers: usize,
    pub correct_answers: usize,
    pub accuracy: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuizStatistics {
    pub average_score: f64,
    pub highest_score: u8,
    pub lowest_score: u8,
    pub question_accuracy: Vec<QuestionAccuracy>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MineGameStatistics {
    pub total_actions: usize,
    pub mines_hit: usize,
    pub pros_found: usize,
    pub misses: usize,
    pub success_rate: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentSession {
    pub team_name: String,
    pub difficulty: Difficulty,
    pub status: SessionStatus,
    pub quiz_score: u8,
    pub mine_score: u32,
    pub pro_score: u32,
    pub started_at: String,
    pub completed_at: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsFilters {
    pub time_range: TimeRange,
    pub difficulty: Option<Difficulty>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub overview: AnalyticsOverview,
    pub quiz_statistics: QuizStatistics,
    pub mine_game_statistics: MineGameStatistics,
    /// Session count per difficulty, in tier order.
    pub difficulty_distribution: IndexMap<Difficulty, usize>,
    pub recent_activity: Vec<RecentSession>,
    pub filters: AnalyticsFilters,
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;

    #[test]
    fn team_view_rounds_accuracy_and_labels_progress() {
        let mut team = TeamEntity::new("  Alpha ", "EASY123", Difficulty::Easy, SystemTime::now());
        team.questions_correct = 7;

        let view = TeamView::from(team.clone());
        assert_eq!(view.team_name, "Alpha");
        assert_eq!(view.quiz_accuracy, 88);
        assert_eq!(view.status, TeamProgress::InProgress);
        assert!(view.completed_at.is_none());

        team.game_completed = true;
        team.completed_at = Some(SystemTime::now());
        let view = TeamView::from(team);
        assert_eq!(view.status, TeamProgress::Completed);
        assert!(view.completed_at.is_some());
    }

    #[test]
    fn time_ranges_parse_from_short_labels() {
        let range: TimeRange = serde_json::from_str("\"7d\"").unwrap();
        assert_eq!(range, TimeRange::LastWeek);
        assert_eq!(range.window(), Some(Duration::from_secs(7 * 24 * 60 * 60)));
        assert_eq!(TimeRange::default(), TimeRange::LastDay);
        assert!(TimeRange::All.window().is_none());
        assert!(serde_json::from_str::<TimeRange>("\"2y\"").is_err());
    }
}
