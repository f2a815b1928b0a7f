//! Business logic powering the admin REST routes: question bank management,
//! quiz timers and team lookups.

use std::{cmp::Reverse, time::SystemTime};

use tokio::time::sleep;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::{
        arcade_store::ArcadeStore,
        models::{QuizQuestionEntity, TimerSettingsEntity},
        storage::StorageError,
    },
    dto::admin::{
        CreateQuestionRequest, DeletedQuestionResponse, GeneratedQuestionsResponse,
        QuestionListResponse, QuestionView, TeamLookupRequest, TeamView, TeamsOverview,
        TimerSettingsView, UpdateQuestionRequest, UpdateTimersRequest,
    },
    error::ServiceError,
    services::question_bank,
    state::{SharedState, game::Difficulty},
};

/// Parse an optional difficulty filter, ignoring values that name no tier.
pub fn difficulty_filter(raw: Option<&str>) -> Option<Difficulty> {
    raw.and_then(|value| value.parse().ok())
}

fn question_not_found() -> ServiceError {
    ServiceError::not_found("QUESTION_NOT_FOUND", "Question not found")
}

fn question_exists(question: &QuizQuestionEntity) -> ServiceError {
    ServiceError::conflict(
        "QUESTION_EXISTS",
        format!(
            "Question {} already exists for {} difficulty",
            question.question_id, question.difficulty
        ),
    )
}

fn slot_conflict(err: StorageError, question: &QuizQuestionEntity) -> ServiceError {
    if err.is_conflict() {
        question_exists(question)
    } else {
        err.into()
    }
}

/// Question bank sorted by difficulty then slot; an unknown difficulty lists everything.
pub async fn list_questions(
    state: &SharedState,
    difficulty: Option<&str>,
) -> Result<QuestionListResponse, ServiceError> {
    let store = state.require_store().await?;
    let questions = store.list_questions(difficulty_filter(difficulty)).await?;

    Ok(QuestionListResponse {
        total: questions.len(),
        questions: questions.into_iter().map(QuestionView::from).collect(),
    })
}

/// Insert a question into a free (difficulty, slot) pair.
pub async fn create_question(
    state: &SharedState,
    request: CreateQuestionRequest,
) -> Result<QuestionView, ServiceError> {
    let store = state.require_store().await?;
    let question = QuizQuestionEntity::new(
        request.difficulty,
        request.question_id,
        request.question.trim().to_owned(),
        request.options,
        request.correct_answer,
        SystemTime::now(),
    );

    let mut inserted = store
        .insert_questions(vec![question.clone()])
        .await
        .map_err(|err| slot_conflict(err, &question))?;
    let question = inserted.pop().ok_or_else(question_not_found)?;

    info!(
        id = %question.id,
        difficulty = %question.difficulty,
        slot = question.question_id,
        "question created"
    );
    Ok(question.into())
}

/// Apply a partial update; fields absent from the request keep their value.
pub async fn update_question(
    state: &SharedState,
    request: UpdateQuestionRequest,
) -> Result<QuestionView, ServiceError> {
    let store = state.require_store().await?;
    let mut question = store
        .find_question(request.id)
        .await?
        .ok_or_else(question_not_found)?;

    if let Some(difficulty) = request.difficulty {
        question.difficulty = difficulty;
    }
    if let Some(slot) = request.question_id {
        question.question_id = slot;
    }
    if let Some(text) = request.question {
        question.question = text.trim().to_owned();
    }
    if let Some(options) = request.options {
        question.options = options;
    }
    if let Some(correct) = request.correct_answer {
        question.correct_answer = correct;
    }

    let updated = store
        .update_question(question.clone())
        .await
        .map_err(|err| slot_conflict(err, &question))?
        .ok_or_else(question_not_found)?;

    info!(id = %updated.id, "question updated");
    Ok(updated.into())
}

/// Delete a question by id; the id is required and must be a UUID.
pub async fn delete_question(
    state: &SharedState,
    id: Option<&str>,
) -> Result<DeletedQuestionResponse, ServiceError> {
    let raw = id
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ServiceError::invalid_input("MISSING_ID", "Question ID is required"))?;
    let id = Uuid::parse_str(raw)
        .map_err(|_| ServiceError::invalid_input("INVALID_ID", "Question ID is malformed"))?;

    let store = state.require_store().await?;
    if !store.delete_question(id).await? {
        return Err(question_not_found());
    }

    info!(%id, "question deleted");
    Ok(DeletedQuestionResponse { id })
}

/// Template questions for a difficulty, returned after the configured delay.
pub async fn generate_questions(
    state: &SharedState,
    difficulty: Difficulty,
) -> GeneratedQuestionsResponse {
    let delay = state.config().question_generation_delay;
    debug!(%difficulty, ?delay, "generating template questions");
    sleep(delay).await;

    GeneratedQuestionsResponse {
        difficulty,
        questions: question_bank::generated(difficulty),
    }
}

/// Stored timer settings, or the configured default when none were saved.
/// The flag tells whether the value comes from storage.
pub async fn timer_settings_entity(
    state: &SharedState,
    store: &dyn ArcadeStore,
) -> Result<(TimerSettingsEntity, bool), ServiceError> {
    Ok(match store.load_timer_settings().await? {
        Some(settings) => (settings, true),
        None => (
            TimerSettingsEntity::uniform(state.config().default_time_limit_secs, SystemTime::now()),
            false,
        ),
    })
}

/// Stored quiz time limits, or the configured default when none were saved.
pub async fn timer_settings(state: &SharedState) -> Result<TimerSettingsView, ServiceError> {
    let store = state.require_store().await?;
    let (settings, persisted) = timer_settings_entity(state, store.as_ref()).await?;
    Ok(TimerSettingsView::from_entity(settings, persisted))
}

/// Replace the per-difficulty quiz time limits.
pub async fn update_timer_settings(
    state: &SharedState,
    request: UpdateTimersRequest,
) -> Result<TimerSettingsView, ServiceError> {
    let store = state.require_store().await?;
    let settings = TimerSettingsEntity {
        easy: request.easy,
        medium: request.medium,
        hard: request.hard,
        updated_at: SystemTime::now(),
    };
    let saved = store.save_timer_settings(settings).await?;

    info!(
        easy = saved.easy,
        medium = saved.medium,
        hard = saved.hard,
        "quiz timers updated"
    );
    Ok(TimerSettingsView::from_entity(saved, true))
}

/// Every team, most recently completed first, then most recently registered.
pub async fn teams_overview(state: &SharedState) -> Result<TeamsOverview, ServiceError> {
    let store = state.require_store().await?;
    let mut teams = store.list_teams().await?;
    teams.sort_by_key(|team| (Reverse(team.completed_at), Reverse(team.created_at)));

    let teams: Vec<TeamView> = teams.into_iter().map(TeamView::from).collect();
    let (completed_only, in_progress_only): (Vec<_>, Vec<_>) =
        teams.iter().cloned().partition(|team| team.game_completed);

    Ok(TeamsOverview {
        total_teams: teams.len(),
        completed_teams: completed_only.len(),
        in_progress_teams: in_progress_only.len(),
        teams,
        completed_only,
        in_progress_only,
    })
}

/// Find one team by name (preferred) or id.
pub async fn lookup_team(
    state: &SharedState,
    request: TeamLookupRequest,
) -> Result<TeamView, ServiceError> {
    let name = request
        .team_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    let id = request
        .team_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());

    if name.is_none() && id.is_none() {
        return Err(ServiceError::invalid_input(
            "INVALID_REQUEST",
            "Please provide either teamName or teamId",
        ));
    }

    let store = state.require_store().await?;
    let team = match (name, id) {
        (Some(name), _) => store.find_team_by_name(name.to_owned()).await?,
        (None, Some(id)) => match Uuid::parse_str(id) {
            Ok(id) => store.find_team(id).await?,
            Err(_) => None,
        },
        (None, _) => None,
    };

    team.map(TeamView::from)
        .ok_or_else(|| ServiceError::not_found("TEAM_NOT_FOUND", "Team not found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_difficulty_filters_are_ignored() {
        assert_eq!(difficulty_filter(Some("hard")), Some(Difficulty::Hard));
        assert_eq!(difficulty_filter(Some("HARD")), None);
        assert_eq!(difficulty_filter(None), None);
    }
}
