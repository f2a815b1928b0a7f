//! Quiz round: question retrieval, answer recording and completion.

use std::time::SystemTime;

use tracing::{debug, error, info, warn};

use crate::{
    dao::models::QuizResponseEntity,
    dto::quiz::{
        CompleteQuizRequest, CompleteQuizResponse, QuestionsResponse, QuizQuestionView,
        SubmitAnswerRequest, SubmitAnswerResponse,
    },
    error::ServiceError,
    services::{admin_service, question_bank},
    state::{
        SharedState,
        game::Difficulty,
        rules,
        status::{self, SessionEvent},
    },
};

/// Parse a required difficulty parameter.
pub fn parse_difficulty(raw: Option<&str>) -> Result<Difficulty, ServiceError> {
    raw.and_then(|value| value.parse().ok()).ok_or_else(|| {
        ServiceError::invalid_input(
            "INVALID_DIFFICULTY",
            "Please provide a valid difficulty level (easy, medium, hard)",
        )
    })
}

/// Questions of a difficulty, seeding the default bank when it is empty.
pub async fn questions(
    state: &SharedState,
    difficulty: Option<&str>,
) -> Result<QuestionsResponse, ServiceError> {
    let difficulty = parse_difficulty(difficulty)?;
    let store = state.require_store().await?;

    let mut questions = store.list_questions(Some(difficulty)).await?;
    if questions.is_empty() {
        let seeds = question_bank::default_entities(difficulty, SystemTime::now());
        match store.insert_questions(seeds).await {
            Ok(inserted) => info!(%difficulty, count = inserted.len(), "seeded default questions"),
            // Another request seeded the bank first.
            Err(err) if err.is_conflict() => debug!(%difficulty, "default questions already seeded"),
            Err(err) => return Err(err.into()),
        }
        questions = store.list_questions(Some(difficulty)).await?;
    }

    let time_limit_seconds = admin_service::timer_settings_entity(state, store.as_ref())
        .await?
        .0
        .for_difficulty(difficulty);

    Ok(QuestionsResponse {
        total_questions: questions.len(),
        questions: questions.into_iter().map(QuizQuestionView::from).collect(),
        difficulty,
        time_limit_seconds,
    })
}

/// Record an answer. A resubmission for the same question keeps the stored
/// question, options and correct index and only replaces the selection.
pub async fn submit_answer(
    state: &SharedState,
    request: SubmitAnswerRequest,
) -> Result<SubmitAnswerResponse, ServiceError> {
    let store = state.require_store().await?;

    if store.find_session(request.session_id.clone()).await?.is_none() {
        return Err(ServiceError::session_not_found());
    }

    let now = SystemTime::now();
    let response = match store
        .find_response(request.session_id.clone(), request.question_id)
        .await?
    {
        Some(mut existing) => {
            existing.selected_answer = request.selected_answer;
            existing.answered_at = now;
            existing
        }
        None => QuizResponseEntity {
            session_id: request.session_id,
            question_id: request.question_id,
            question: request.question,
            options: request.options,
            selected_answer: request.selected_answer,
            correct_answer: request.correct_answer,
            is_correct: false,
            answered_at: now,
        },
    };

    let saved = store.save_response(response).await?;
    debug!(
        session_id = %saved.session_id,
        question_id = saved.question_id,
        is_correct = saved.is_correct,
        "answer recorded"
    );

    Ok(SubmitAnswerResponse {
        question_id: saved.question_id,
        is_correct: saved.is_correct,
    })
}

/// Close the quiz: fix the score and mine game eligibility, then mirror the
/// summary onto the team.
pub async fn complete(
    state: &SharedState,
    request: CompleteQuizRequest,
) -> Result<CompleteQuizResponse, ServiceError> {
    let store = state.require_store().await?;

    let mut session = store
        .find_session(request.session_id.clone())
        .await?
        .ok_or_else(ServiceError::session_not_found)?;

    session.status = status::advance(session.status, SessionEvent::QuizCompleted)?;
    session.quiz_score = request.score;
    session.can_play_mine = rules::can_play_mine(request.score, session.difficulty);
    let session = store.save_session(session).await?;

    let verified_score = store
        .list_responses(Some(session.session_id.clone()))
        .await?
        .iter()
        .filter(|response| response.is_correct)
        .count();

    match store.find_team(session.team_id).await? {
        Some(mut team) => {
            team.questions_correct = u8::try_from(verified_score).unwrap_or(u8::MAX);
            team.total_questions = request.total_questions;
            team.quiz_score = request.score;
            if let Err(err) = store.update_team(team).await {
                error!(
                    session_id = %session.session_id,
                    team_id = %session.team_id,
                    error = %err,
                    "session saved but team quiz summary update failed"
                );
                return Err(err.into());
            }
        }
        None => warn!(
            session_id = %session.session_id,
            team_id = %session.team_id,
            "quiz completed for a session whose team is missing"
        ),
    }

    if usize::from(request.score) != verified_score {
        warn!(
            session_id = %session.session_id,
            reported = request.score,
            verified = verified_score,
            "reported quiz score differs from recorded answers"
        );
    }

    info!(
        session_id = %session.session_id,
        score = session.quiz_score,
        can_play_mine = session.can_play_mine,
        "quiz completed"
    );

    Ok(CompleteQuizResponse {
        score: session.quiz_score,
        total_questions: request.total_questions,
        can_play_mine: session.can_play_mine,
        difficulty: session.difficulty,
        verified_score,
        requirement: rules::mine_threshold(session.difficulty),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parameter_is_required() {
        assert_eq!(parse_difficulty(Some("medium")).ok(), Some(Difficulty::Medium));
        assert!(matches!(
            parse_difficulty(None),
            Err(ServiceError::InvalidInput {
                code: "INVALID_DIFFICULTY",
                ..
            })
        ));
        assert!(parse_difficulty(Some("expert")).is_err());
    }
}
