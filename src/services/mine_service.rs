//! Mine game: grid configuration, cell reveals and final scoring.

use std::time::SystemTime;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    dao::models::{GameSessionEntity, MineActionEntity},
    dao::arcade_store::ArcadeStore,
    dto::{
        format_system_time,
        mine::{
            CompleteMineRequest, CompleteMineResponse, MineActionRequest, MineActionResponse,
            MineStatistics, StartMineRequest, StartMineResponse,
        },
    },
    error::ServiceError,
    state::{
        SharedState,
        game::RevealResult,
        rules::{self, MINE_POINTS, MineGridConfig, PRO_POINTS},
        status::{self, SessionEvent},
    },
};

/// Load a session that has unlocked the mine game.
async fn eligible_session(
    store: &dyn ArcadeStore,
    session_id: &str,
) -> Result<GameSessionEntity, ServiceError> {
    let session = store
        .find_session(session_id.to_owned())
        .await?
        .ok_or_else(ServiceError::session_not_found)?;

    if !session.can_play_mine {
        return Err(ServiceError::forbidden(
            "NOT_ELIGIBLE",
            "Quiz score not sufficient for mine game",
        ));
    }
    Ok(session)
}

/// Hand out the grid layout for the session's own difficulty.
pub async fn start(
    state: &SharedState,
    request: StartMineRequest,
) -> Result<StartMineResponse, ServiceError> {
    let store = state.require_store().await?;
    let session = eligible_session(store.as_ref(), &request.session_id).await?;

    if let Some(requested) = request.difficulty.filter(|d| *d != session.difficulty) {
        debug!(
            session_id = %session.session_id,
            %requested,
            actual = %session.difficulty,
            "ignoring requested mine game difficulty"
        );
    }

    info!(session_id = %session.session_id, "mine game started");
    Ok(StartMineResponse {
        session_id: session.session_id,
        config: MineGridConfig::for_difficulty(session.difficulty),
        difficulty: session.difficulty,
    })
}

/// Score one revealed cell and append it to the action log.
pub async fn reveal(
    state: &SharedState,
    request: MineActionRequest,
) -> Result<MineActionResponse, ServiceError> {
    let store = state.require_store().await?;
    let mut session = eligible_session(store.as_ref(), &request.session_id).await?;

    if session.status.mine_done() {
        return Err(ServiceError::conflict(
            "GAME_COMPLETED",
            "Mine game already completed for this session",
        ));
    }

    let outcome = rules::score_cell(request.cell_type);
    let action = MineActionEntity {
        id: Uuid::new_v4(),
        session_id: session.session_id.clone(),
        cell_x: request.cell_x,
        cell_y: request.cell_y,
        cell_type: request.cell_type,
        action: request.action,
        result: outcome.result,
        action_at: SystemTime::now(),
    };
    let action = store.insert_action(action).await?;

    session.mine_score = session.mine_score.saturating_add(outcome.mine_points);
    session.pro_score = session.pro_score.saturating_add(outcome.pro_points);
    let session = store.save_session(session).await?;

    debug!(
        session_id = %session.session_id,
        cell_x = action.cell_x,
        cell_y = action.cell_y,
        result = ?action.result,
        "cell revealed"
    );

    Ok(MineActionResponse {
        cell_x: action.cell_x,
        cell_y: action.cell_y,
        cell_type: action.cell_type,
        result: action.result,
        score_increase: outcome.score_increase(),
        current_mine_score: session.mine_score,
        current_pro_score: session.pro_score,
        total_score: session.mine_score.saturating_add(session.pro_score),
    })
}

fn logged_points(count: usize, points: u32) -> u32 {
    u32::try_from(count)
        .unwrap_or(u32::MAX)
        .saturating_mul(points)
}

/// Record the final mine/pro totals reported by the client and stamp the team
/// as complete. The totals overwrite the running scores; a disagreement with
/// the action log is only reported.
pub async fn complete(
    state: &SharedState,
    request: CompleteMineRequest,
) -> Result<CompleteMineResponse, ServiceError> {
    let store = state.require_store().await?;
    let mut session = eligible_session(store.as_ref(), &request.session_id).await?;

    session.status = status::advance(session.status, SessionEvent::MineCompleted)?;

    let actions = store
        .list_actions(Some(session.session_id.clone()))
        .await?;
    let mines_found = actions
        .iter()
        .filter(|action| action.result == RevealResult::Hit)
        .count();
    let pros_found = actions
        .iter()
        .filter(|action| action.result == RevealResult::ProFound)
        .count();

    let logged_mine = logged_points(mines_found, MINE_POINTS);
    let logged_pro = logged_points(pros_found, PRO_POINTS);
    if logged_mine != request.final_mine_score || logged_pro != request.final_pro_score {
        warn!(
            session_id = %session.session_id,
            reported_mine = request.final_mine_score,
            reported_pro = request.final_pro_score,
            logged_mine,
            logged_pro,
            "reported mine game totals differ from the action log"
        );
    }

    let now = SystemTime::now();
    session.mine_score = request.final_mine_score;
    session.pro_score = request.final_pro_score;
    session.completed_at = Some(now);
    let session = store.save_session(session).await?;

    let grand_total = rules::grand_total(session.quiz_score, session.mine_score, session.pro_score);

    match store.find_team(session.team_id).await? {
        Some(mut team) => {
            team.game_completed = true;
            team.completed_at = Some(now);
            team.mine_score = session.mine_score;
            team.pro_score = session.pro_score;
            team.total_score = grand_total;
            if let Err(err) = store.update_team(team).await {
                error!(
                    session_id = %session.session_id,
                    team_id = %session.team_id,
                    error = %err,
                    "session completed but team final totals update failed"
                );
                return Err(err.into());
            }
        }
        None => warn!(
            session_id = %session.session_id,
            team_id = %session.team_id,
            "mine game completed for a session whose team is missing"
        ),
    }

    info!(session_id = %session.session_id, grand_total, "mine game completed");

    Ok(CompleteMineResponse {
        final_mine_score: session.mine_score,
        final_pro_score: session.pro_score,
        total_score: session.mine_score.saturating_add(session.pro_score),
        quiz_score: session.quiz_score,
        grand_total,
        statistics: MineStatistics {
            mines_found,
            pros_found,
            total_actions: actions.len(),
            completed_at: format_system_time(now),
        },
    })
}
