//! Forward-only progression of [`SessionStatus`].

use thiserror::Error;

use crate::state::game::SessionStatus;

/// Events that move a game session forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The team submitted its quiz.
    QuizCompleted,
    /// The team submitted its final mine game scores.
    MineCompleted,
    /// The session is closed for good.
    Finish,
}

/// Error returned when an event does not follow an edge from the current status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while session is {from:?}")]
pub struct InvalidTransition {
    pub from: SessionStatus,
    pub event: SessionEvent,
}

/// Compute the status reached by applying `event` to `from`.
pub fn advance(from: SessionStatus, event: SessionEvent) -> Result<SessionStatus, InvalidTransition> {
    match (from, event) {
        (SessionStatus::Active, SessionEvent::QuizCompleted) => Ok(SessionStatus::QuizCompleted),
        (SessionStatus::QuizCompleted, SessionEvent::MineCompleted) => {
            Ok(SessionStatus::MineCompleted)
        }
        (SessionStatus::MineCompleted, SessionEvent::Finish) => Ok(SessionStatus::Finished),
        _ => Err(InvalidTransition { from, event }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_happy_path() {
        let status = advance(SessionStatus::Active, SessionEvent::QuizCompleted).unwrap();
        assert_eq!(status, SessionStatus::QuizCompleted);
        let status = advance(status, SessionEvent::MineCompleted).unwrap();
        assert_eq!(status, SessionStatus::MineCompleted);
        let status = advance(status, SessionEvent::Finish).unwrap();
        assert_eq!(status, SessionStatus::Finished);
    }

    #[test]
    fn quiz_cannot_be_completed_twice() {
        let err = advance(SessionStatus::QuizCompleted, SessionEvent::QuizCompleted).unwrap_err();
        assert_eq!(err.from, SessionStatus::QuizCompleted);
        assert_eq!(err.event, SessionEvent::QuizCompleted);
    }

    #[test]
    fn mine_game_requires_completed_quiz() {
        assert!(advance(SessionStatus::Active, SessionEvent::MineCompleted).is_err());
        assert!(advance(SessionStatus::MineCompleted, SessionEvent::MineCompleted).is_err());
    }

    #[test]
    fn finished_is_terminal() {
        for event in [
            SessionEvent::QuizCompleted,
            SessionEvent::MineCompleted,
            SessionEvent::Finish,
        ] {
            assert!(advance(SessionStatus::Finished, event).is_err());
        }
    }
}
