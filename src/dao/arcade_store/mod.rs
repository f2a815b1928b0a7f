#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    GameSessionEntity, MineActionEntity, QuizQuestionEntity, QuizResponseEntity, TeamEntity,
    TimerSettingsEntity,
};
use crate::dao::storage::StorageResult;
use crate::state::game::Difficulty;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Abstraction over the persistence layer for teams, sessions, the question bank and the
/// quiz/mine game logs.
///
/// Implementations run [`crate::dao::models::BeforeSave`] on every entity they write and
/// report unique constraint violations as [`crate::dao::storage::StorageError::Conflict`].
pub trait ArcadeStore: Send + Sync {
    /// Insert a new team; a name whose key is already taken yields a conflict.
    fn insert_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<TeamEntity>>;
    fn update_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<TeamEntity>>;
    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    /// Look a team up by name, ignoring case and surrounding whitespace.
    fn find_team_by_name(
        &self,
        name: String,
    ) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>>;

    fn insert_session(
        &self,
        session: GameSessionEntity,
    ) -> BoxFuture<'static, StorageResult<GameSessionEntity>>;
    fn save_session(
        &self,
        session: GameSessionEntity,
    ) -> BoxFuture<'static, StorageResult<GameSessionEntity>>;
    fn find_session(
        &self,
        session_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<GameSessionEntity>>>;
    fn list_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<GameSessionEntity>>>;

    /// Questions ordered by difficulty then slot.
    fn list_questions(
        &self,
        difficulty: Option<Difficulty>,
    ) -> BoxFuture<'static, StorageResult<Vec<QuizQuestionEntity>>>;
    fn find_question(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<QuizQuestionEntity>>>;
    /// Insert questions; an occupied (difficulty, slot) pair yields a conflict.
    fn insert_questions(
        &self,
        questions: Vec<QuizQuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<Vec<QuizQuestionEntity>>>;
    /// Replace an existing question, returning `None` when its id is unknown.
    fn update_question(
        &self,
        question: QuizQuestionEntity,
    ) -> BoxFuture<'static, StorageResult<Option<QuizQuestionEntity>>>;
    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    fn find_response(
        &self,
        session_id: String,
        question_id: u8,
    ) -> BoxFuture<'static, StorageResult<Option<QuizResponseEntity>>>;
    /// Upsert keyed by (session, question).
    fn save_response(
        &self,
        response: QuizResponseEntity,
    ) -> BoxFuture<'static, StorageResult<QuizResponseEntity>>;
    fn list_responses(
        &self,
        session_id: Option<String>,
    ) -> BoxFuture<'static, StorageResult<Vec<QuizResponseEntity>>>;

    fn insert_action(
        &self,
        action: MineActionEntity,
    ) -> BoxFuture<'static, StorageResult<MineActionEntity>>;
    /// Actions in the order they were recorded.
    fn list_actions(
        &self,
        session_id: Option<String>,
    ) -> BoxFuture<'static, StorageResult<Vec<MineActionEntity>>>;

    fn load_timer_settings(&self) -> BoxFuture<'static, StorageResult<Option<TimerSettingsEntity>>>;
    fn save_timer_settings(
        &self,
        settings: TimerSettingsEntity,
    ) -> BoxFuture<'static, StorageResult<TimerSettingsEntity>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Sort key shared by every backend for question listings.
pub(crate) fn sort_questions(questions: &mut [QuizQuestionEntity]) {
    questions.sort_by_key(|q| (q.difficulty, q.question_id));
}
