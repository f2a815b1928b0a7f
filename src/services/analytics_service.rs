//! Read-only reporting over teams, sessions and the quiz/mine logs.
//!
//! Loading is async; every aggregation below is a pure function of a
//! [`Snapshot`] so it can be tested without a store.

use std::{
    cmp::Reverse,
    collections::HashMap,
    time::SystemTime,
};

use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    dao::{
        arcade_store::ArcadeStore,
        models::{GameSessionEntity, MineActionEntity, QuizResponseEntity, TeamEntity},
    },
    dto::{
        admin::{
            AnalyticsFilters, AnalyticsOverview, AnalyticsResponse, LeaderboardFilters,
            LeaderboardResponse, LeaderboardRow, LeaderboardSort, LeaderboardSummary,
            MineGameStatistics, QuestionAccuracy, QuizStatistics, RecentSession, TimeRange,
        },
        format_system_time,
    },
    error::ServiceError,
    services::admin_service::difficulty_filter,
    state::{
        SharedState,
        game::{Difficulty, RevealResult},
        rules::{grand_total, percentage, round2},
    },
};

/// Rows returned by the leaderboard when no limit is given.
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 50;
const RECENT_ACTIVITY_LEN: usize = 10;

/// Everything the reports read, loaded once per request.
#[derive(Debug, Default, Clone)]
pub struct Snapshot {
    pub teams: Vec<TeamEntity>,
    pub sessions: Vec<GameSessionEntity>,
    pub responses: Vec<QuizResponseEntity>,
    pub actions: Vec<MineActionEntity>,
}

impl Snapshot {
    /// Read every team, session, response and action from `store`.
    pub async fn load(store: &dyn ArcadeStore) -> Result<Self, ServiceError> {
        Ok(Self {
            teams: store.list_teams().await?,
            sessions: store.list_sessions().await?,
            responses: store.list_responses(None).await?,
            actions: store.list_actions(None).await?,
        })
    }

    fn teams_by_id(&self) -> HashMap<Uuid, &TeamEntity> {
        self.teams.iter().map(|team| (team.id, team)).collect()
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct ResponseTally {
    total: usize,
    correct: usize,
}

#[derive(Debug, Default, Clone, Copy)]
struct ActionTally {
    total: usize,
    mines: usize,
    pros: usize,
}

fn tally_responses(responses: &[QuizResponseEntity]) -> HashMap<&str, ResponseTally> {
    let mut tallies: HashMap<&str, ResponseTally> = HashMap::new();
    for response in responses {
        let tally = tallies.entry(response.session_id.as_str()).or_default();
        tally.total += 1;
        if response.is_correct {
            tally.correct += 1;
        }
    }
    tallies
}

fn tally_actions(actions: &[MineActionEntity]) -> HashMap<&str, ActionTally> {
    let mut tallies: HashMap<&str, ActionTally> = HashMap::new();
    for action in actions {
        let tally = tallies.entry(action.session_id.as_str()).or_default();
        tally.total += 1;
        match action.result {
            RevealResult::Hit => tally.mines += 1,
            RevealResult::ProFound => tally.pros += 1,
            RevealResult::Miss => {}
        }
    }
    tallies
}

fn rate(part: usize, whole: usize) -> f64 {
    round2(percentage(part as u64, whole as u64))
}

fn sort_value(row: &LeaderboardRow, sort: LeaderboardSort) -> f64 {
    match sort {
        LeaderboardSort::TotalScore => f64::from(row.total_score),
        LeaderboardSort::GrandTotal => f64::from(row.grand_total),
        LeaderboardSort::QuizScore => f64::from(row.quiz_score),
        LeaderboardSort::MineScore => f64::from(row.mine_score),
        LeaderboardSort::ProScore => f64::from(row.pro_score),
        LeaderboardSort::QuizAccuracy => row.quiz_accuracy,
        LeaderboardSort::MineSuccessRate => row.mine_success_rate,
    }
}

/// Join sessions with their team and logs, ranked by `sort` (descending) then
/// by start time (newest first). Sessions whose team is gone are skipped.
pub fn build_leaderboard(
    snapshot: &Snapshot,
    difficulty: Option<Difficulty>,
    sort: LeaderboardSort,
    limit: usize,
) -> LeaderboardResponse {
    let teams = snapshot.teams_by_id();
    let responses = tally_responses(&snapshot.responses);
    let actions = tally_actions(&snapshot.actions);

    let sessions: Vec<&GameSessionEntity> = snapshot
        .sessions
        .iter()
        .filter(|session| difficulty.is_none_or(|d| session.difficulty == d))
        .collect();

    let mut ranked: Vec<(SystemTime, LeaderboardRow)> = sessions
        .iter()
        .filter_map(|session| {
            let team = teams.get(&session.team_id)?;
            let answers = responses
                .get(session.session_id.as_str())
                .copied()
                .unwrap_or_default();
            let reveals = actions
                .get(session.session_id.as_str())
                .copied()
                .unwrap_or_default();

            let row = LeaderboardRow {
                team_name: team.team_name.clone(),
                difficulty: session.difficulty,
                session_id: session.session_id.clone(),
                status: session.status,
                started_at: format_system_time(session.started_at),
                completed_at: session.completed_at.map(format_system_time),
                quiz_score: session.quiz_score,
                mine_score: session.mine_score,
                pro_score: session.pro_score,
                total_score: session.total_score,
                grand_total: grand_total(session.quiz_score, session.mine_score, session.pro_score),
                can_play_mine: session.can_play_mine,
                correct_answers: answers.correct,
                total_questions: answers.total,
                quiz_accuracy: rate(answers.correct, answers.total),
                mines_found: reveals.mines,
                pros_found: reveals.pros,
                total_mine_actions: reveals.total,
                mine_success_rate: rate(reveals.mines + reveals.pros, reveals.total),
            };
            Some((session.started_at, row))
        })
        .collect();

    ranked.sort_by(|(a_start, a), (b_start, b)| {
        sort_value(b, sort)
            .total_cmp(&sort_value(a, sort))
            .then_with(|| b_start.cmp(a_start))
    });

    let completed_sessions = sessions
        .iter()
        .filter(|session| session.status.mine_done())
        .count();
    let total_teams = snapshot
        .teams
        .iter()
        .filter(|team| difficulty.is_none_or(|d| team.difficulty == d))
        .count();

    LeaderboardResponse {
        leaderboard: ranked.into_iter().take(limit).map(|(_, row)| row).collect(),
        summary: LeaderboardSummary {
            total_teams,
            total_sessions: sessions.len(),
            completed_sessions,
            completion_rate: rate(completed_sessions, sessions.len()),
        },
        filters: LeaderboardFilters {
            difficulty,
            sort_by: sort,
            limit,
        },
    }
}

/// The `count` most recently started sessions with their team name.
pub fn recent_sessions(snapshot: &Snapshot, count: usize) -> Vec<RecentSession> {
    let teams = snapshot.teams_by_id();
    let mut sessions: Vec<&GameSessionEntity> = snapshot.sessions.iter().collect();
    sessions.sort_by_key(|session| Reverse(session.started_at));

    sessions
        .into_iter()
        .take(count)
        .map(|session| RecentSession {
            team_name: teams
                .get(&session.team_id)
                .map(|team| team.team_name.clone())
                .unwrap_or_default(),
            difficulty: session.difficulty,
            status: session.status,
            quiz_score: session.quiz_score,
            mine_score: session.mine_score,
            pro_score: session.pro_score,
            started_at: format_system_time(session.started_at),
            completed_at: session.completed_at.map(format_system_time),
        })
        .collect()
}

/// Restrict a snapshot to a time window and difficulty. Logs follow the
/// sessions they belong to.
pub fn scope(
    snapshot: Snapshot,
    range: TimeRange,
    difficulty: Option<Difficulty>,
    now: SystemTime,
) -> Snapshot {
    let since = range.window().and_then(|window| now.checked_sub(window));
    let in_window = |at: SystemTime| since.is_none_or(|since| at >= since);
    let in_tier = |d: Difficulty| difficulty.is_none_or(|wanted| d == wanted);

    let teams: Vec<TeamEntity> = snapshot
        .teams
        .into_iter()
        .filter(|team| in_window(team.created_at) && in_tier(team.difficulty))
        .collect();
    let sessions: Vec<GameSessionEntity> = snapshot
        .sessions
        .into_iter()
        .filter(|session| in_window(session.started_at) && in_tier(session.difficulty))
        .collect();

    let session_ids: HashMap<&str, Difficulty> = sessions
        .iter()
        .map(|session| (session.session_id.as_str(), session.difficulty))
        .collect();
    let responses = snapshot
        .responses
        .into_iter()
        .filter(|response| session_ids.contains_key(response.session_id.as_str()))
        .collect();
    let actions = snapshot
        .actions
        .into_iter()
        .filter(|action| session_ids.contains_key(action.session_id.as_str()))
        .collect();

    Snapshot {
        teams,
        sessions,
        responses,
        actions,
    }
}

fn quiz_statistics(snapshot: &Snapshot) -> QuizStatistics {
    let scores: Vec<u8> = snapshot
        .sessions
        .iter()
        .map(|session| session.quiz_score)
        .filter(|score| *score > 0)
        .collect();
    let average_score = if scores.is_empty() {
        0.0
    } else {
        round2(scores.iter().map(|s| f64::from(*s)).sum::<f64>() / scores.len() as f64)
    };

    let difficulty_of: HashMap<&str, Difficulty> = snapshot
        .sessions
        .iter()
        .map(|session| (session.session_id.as_str(), session.difficulty))
        .collect();

    let mut per_question: IndexMap<(Difficulty, u8), QuestionAccuracy> = IndexMap::new();
    for response in &snapshot.responses {
        let Some(difficulty) = difficulty_of.get(response.session_id.as_str()).copied() else {
            continue;
        };
        let entry = per_question
            .entry((difficulty, response.question_id))
            .or_insert_with(|| QuestionAccuracy {
                question_id: response.question_id,
                difficulty,
                question: response.question.clone(),
                total_answers: 0,
                correct_answers: 0,
                accuracy: 0.0,
            });
        entry.total_answers += 1;
        if response.is_correct {
            entry.correct_answers += 1;
        }
    }
    per_question.sort_keys();

    let question_accuracy = per_question
        .into_values()
        .map(|mut entry| {
            entry.accuracy = rate(entry.correct_answers, entry.total_answers);
            entry
        })
        .collect();

    QuizStatistics {
        average_score,
        highest_score: scores.iter().copied().max().unwrap_or(0),
        lowest_score: scores.iter().copied().min().unwrap_or(0),
        question_accuracy,
    }
}

fn mine_statistics(snapshot: &Snapshot) -> MineGameStatistics {
    let count = |wanted: RevealResult| {
        snapshot
            .actions
            .iter()
            .filter(|action| action.result == wanted)
            .count()
    };
    let mines_hit = count(RevealResult::Hit);
    let pros_found = count(RevealResult::ProFound);
    let total_actions = snapshot.actions.len();

    MineGameStatistics {
        total_actions,
        mines_hit,
        pros_found,
        misses: count(RevealResult::Miss),
        success_rate: rate(mines_hit + pros_found, total_actions),
    }
}

/// Aggregate a scoped snapshot into the analytics report.
pub fn build_analytics(
    snapshot: &Snapshot,
    range: TimeRange,
    difficulty: Option<Difficulty>,
) -> AnalyticsResponse {
    let total_sessions = snapshot.sessions.len();
    let completed_quizzes = snapshot
        .sessions
        .iter()
        .filter(|session| session.status.quiz_done())
        .count();
    let completed_mine_games = snapshot
        .sessions
        .iter()
        .filter(|session| session.status.mine_done())
        .count();

    let mut difficulty_distribution: IndexMap<Difficulty, usize> =
        Difficulty::ALL.iter().map(|d| (*d, 0)).collect();
    for session in &snapshot.sessions {
        *difficulty_distribution.entry(session.difficulty).or_default() += 1;
    }

    AnalyticsResponse {
        overview: AnalyticsOverview {
            total_teams: snapshot.teams.len(),
            total_sessions,
            completed_quizzes,
            completed_mine_games,
            quiz_completion_rate: rate(completed_quizzes, total_sessions),
            mine_game_completion_rate: rate(completed_mine_games, completed_quizzes),
        },
        quiz_statistics: quiz_statistics(snapshot),
        mine_game_statistics: mine_statistics(snapshot),
        difficulty_distribution,
        recent_activity: recent_sessions(snapshot, RECENT_ACTIVITY_LEN),
        filters: AnalyticsFilters {
            time_range: range,
            difficulty,
        },
    }
}

/// Ranked sessions, `limit` defaulting to 50 and sorting to total score.
pub async fn leaderboard(
    state: &SharedState,
    difficulty: Option<&str>,
    sort: Option<LeaderboardSort>,
    limit: Option<usize>,
) -> Result<LeaderboardResponse, ServiceError> {
    let store = state.require_store().await?;
    let snapshot = Snapshot::load(store.as_ref()).await?;
    Ok(build_leaderboard(
        &snapshot,
        difficulty_filter(difficulty),
        sort.unwrap_or_default(),
        limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT),
    ))
}

/// Analytics report over `range` (default 24h).
pub async fn analytics(
    state: &SharedState,
    range: Option<TimeRange>,
    difficulty: Option<&str>,
) -> Result<AnalyticsResponse, ServiceError> {
    let store = state.require_store().await?;
    let range = range.unwrap_or_default();
    let difficulty = difficulty_filter(difficulty);
    let snapshot = Snapshot::load(store.as_ref()).await?;
    let scoped = scope(snapshot, range, difficulty, SystemTime::now());
    Ok(build_analytics(&scoped, range, difficulty))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        dao::models::BeforeSave,
        state::game::{CellAction, CellType, SessionStatus},
    };

    fn fixture() -> Snapshot {
        let now = SystemTime::now();
        let alpha = TeamEntity::new("Alpha", "EASY123", Difficulty::Easy, now);
        let beta = TeamEntity::new("Beta", "HARD789", Difficulty::Hard, now);

        let mut alpha_session =
            GameSessionEntity::new("1-alpha".into(), alpha.id, Difficulty::Easy, now);
        alpha_session.status = SessionStatus::MineCompleted;
        alpha_session.quiz_score = 7;
        alpha_session.mine_score = 200;
        alpha_session.pro_score = 200;
        alpha_session.can_play_mine = true;
        alpha_session.before_save(now);

        let mut beta_session = GameSessionEntity::new(
            "2-beta".into(),
            beta.id,
            Difficulty::Hard,
            now - Duration::from_secs(60),
        );
        beta_session.status = SessionStatus::QuizCompleted;
        beta_session.quiz_score = 3;
        beta_session.before_save(now);

        let response = |session: &str, question_id: u8, correct: bool| QuizResponseEntity {
            session_id: session.into(),
            question_id,
            question: format!("Q{question_id}"),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            selected_answer: if correct { 1 } else { 0 },
            correct_answer: 1,
            is_correct: correct,
            answered_at: now,
        };
        let action = |cell_type: CellType, result: RevealResult| MineActionEntity {
            id: Uuid::new_v4(),
            session_id: "1-alpha".into(),
            cell_x: 0,
            cell_y: 0,
            cell_type,
            action: CellAction::Reveal,
            result,
            action_at: now,
        };

        Snapshot {
            teams: vec![alpha, beta],
            sessions: vec![alpha_session, beta_session],
            responses: vec![
                response("1-alpha", 1, true),
                response("1-alpha", 2, false),
                response("2-beta", 1, true),
            ],
            actions: vec![
                action(CellType::Mine, RevealResult::Hit),
                action(CellType::Mine, RevealResult::Hit),
                action(CellType::Pro, RevealResult::ProFound),
                action(CellType::Blank, RevealResult::Miss),
            ],
        }
    }

    #[test]
    fn leaderboard_ranks_by_total_and_joins_logs() {
        let board = build_leaderboard(&fixture(), None, LeaderboardSort::TotalScore, 50);
        assert_eq!(board.leaderboard.len(), 2);

        let top = &board.leaderboard[0];
        assert_eq!(top.team_name, "Alpha");
        assert_eq!(top.grand_total, 470);
        assert_eq!(top.total_score, 470);
        assert_eq!(top.correct_answers, 1);
        assert_eq!(top.total_questions, 2);
        assert_eq!(top.quiz_accuracy, 50.0);
        assert_eq!(top.mines_found, 2);
        assert_eq!(top.pros_found, 1);
        assert_eq!(top.mine_success_rate, 75.0);

        assert_eq!(board.summary.total_sessions, 2);
        assert_eq!(board.summary.completed_sessions, 1);
        assert_eq!(board.summary.completion_rate, 50.0);
    }

    #[test]
    fn leaderboard_filters_and_limits() {
        let board = build_leaderboard(
            &fixture(),
            Some(Difficulty::Hard),
            LeaderboardSort::QuizScore,
            1,
        );
        assert_eq!(board.leaderboard.len(), 1);
        assert_eq!(board.leaderboard[0].team_name, "Beta");
        assert_eq!(board.summary.total_teams, 1);

        let limited = build_leaderboard(&fixture(), None, LeaderboardSort::TotalScore, 1);
        assert_eq!(limited.leaderboard.len(), 1);
        assert_eq!(limited.leaderboard[0].team_name, "Alpha");
    }

    #[test]
    fn analytics_aggregates_rates_and_distribution() {
        let report = build_analytics(&fixture(), TimeRange::All, None);

        assert_eq!(report.overview.total_sessions, 2);
        assert_eq!(report.overview.completed_quizzes, 2);
        assert_eq!(report.overview.completed_mine_games, 1);
        assert_eq!(report.overview.quiz_completion_rate, 100.0);
        assert_eq!(report.overview.mine_game_completion_rate, 50.0);

        assert_eq!(report.quiz_statistics.average_score, 5.0);
        assert_eq!(report.quiz_statistics.highest_score, 7);
        assert_eq!(report.quiz_statistics.lowest_score, 3);
        let first = &report.quiz_statistics.question_accuracy[0];
        assert_eq!((first.difficulty, first.question_id), (Difficulty::Easy, 1));

        assert_eq!(report.mine_game_statistics.misses, 1);
        assert_eq!(report.mine_game_statistics.success_rate, 75.0);

        let tiers: Vec<_> = report.difficulty_distribution.iter().collect();
        assert_eq!(
            tiers,
            vec![
                (&Difficulty::Easy, &1),
                (&Difficulty::Medium, &0),
                (&Difficulty::Hard, &1)
            ]
        );
        assert_eq!(report.recent_activity[0].team_name, "Alpha");
    }

    #[test]
    fn scope_drops_sessions_outside_window_with_their_logs() {
        let mut snapshot = fixture();
        let old = SystemTime::now() - Duration::from_secs(3 * 60 * 60);
        snapshot.sessions[1].started_at = old;

        let scoped = scope(snapshot, TimeRange::LastHour, None, SystemTime::now());
        assert_eq!(scoped.sessions.len(), 1);
        assert!(scoped.responses.iter().all(|r| r.session_id == "1-alpha"));
    }

    #[test]
    fn empty_snapshot_reports_zeroes() {
        let report = build_analytics(&Snapshot::default(), TimeRange::LastDay, None);
        assert_eq!(report.overview.quiz_completion_rate, 0.0);
        assert_eq!(report.quiz_statistics.average_score, 0.0);
        assert!(report.recent_activity.is_empty());
    }
}
