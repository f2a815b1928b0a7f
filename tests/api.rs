use std::{sync::Arc, time::Duration};

use arcade_quiz_back::{
    config::AppConfig,
    dao::arcade_store::memory::MemoryStore,
    routes,
    state::{AppState, SharedState},
};
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

const ADMIN_CODE: &str = "techteammode";

fn test_config() -> AppConfig {
    AppConfig {
        question_generation_delay: Duration::ZERO,
        ..AppConfig::default()
    }
}

async fn app_with(config: AppConfig) -> (Router, SharedState) {
    let state = AppState::with_store(config, Arc::new(MemoryStore::new())).await;
    (routes::router(state.clone()), state)
}

async fn app() -> Router {
    app_with(test_config()).await.0
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>, admin: bool) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if admin {
        builder = builder.header("x-admin-code", ADMIN_CODE);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Reply {
        status,
        headers,
        body,
    }
}

async fn post(app: &Router, uri: &str, body: Value) -> Reply {
    send(app, Method::POST, uri, Some(body), false).await
}

async fn get(app: &Router, uri: &str) -> Reply {
    send(app, Method::GET, uri, None, false).await
}

async fn register(app: &Router, name: &str, code: &str) -> Reply {
    post(app, "/teams/register", json!({ "teamName": name, "accessCode": code })).await
}

async fn registered_session(app: &Router, name: &str, code: &str) -> String {
    let reply = register(app, name, code).await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    reply.body["data"]["sessionId"].as_str().unwrap().to_owned()
}

async fn complete_quiz(app: &Router, session_id: &str, score: u8) -> Reply {
    post(
        app,
        "/quiz/complete",
        json!({ "sessionId": session_id, "score": score, "totalQuestions": 8 }),
    )
    .await
}

async fn answer(app: &Router, session_id: &str, question_id: u8, selected: u8, correct: u8) -> Reply {
    post(
        app,
        "/quiz/submit-answer",
        json!({
            "sessionId": session_id,
            "questionId": question_id,
            "question": format!("Question {question_id}"),
            "options": ["a", "b", "c", "d"],
            "selectedAnswer": selected,
            "correctAnswer": correct,
        }),
    )
    .await
}

async fn reveal(app: &Router, session_id: &str, x: u8, y: u8, cell: &str) -> Reply {
    post(
        app,
        "/mine-game/action",
        json!({ "sessionId": session_id, "cellX": x, "cellY": y, "cellType": cell }),
    )
    .await
}

#[tokio::test]
async fn alpha_plays_through_to_a_grand_total_of_470() {
    let app = app().await;

    let registration = register(&app, "Alpha", "EASY123").await;
    assert_eq!(registration.status, StatusCode::OK);
    assert_eq!(registration.body["success"], true);
    assert_eq!(registration.body["data"]["difficulty"], "easy");
    assert_eq!(registration.body["message"], "Team registered successfully");
    let session_id = registration.body["data"]["sessionId"]
        .as_str()
        .unwrap()
        .to_owned();

    let questions = get(&app, "/quiz/questions?difficulty=easy").await;
    assert_eq!(questions.status, StatusCode::OK);
    assert_eq!(questions.body["data"]["totalQuestions"], 8);
    assert_eq!(questions.body["data"]["timeLimitSeconds"], 300);
    assert_eq!(
        questions.body["data"]["questions"][0]["question"],
        "What does HTML stand for?"
    );

    for question_id in 1..=8u8 {
        let selected = if question_id == 8 { 0 } else { 2 };
        let reply = answer(&app, &session_id, question_id, selected, 2).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["data"]["isCorrect"], question_id != 8);
    }

    let quiz = complete_quiz(&app, &session_id, 7).await;
    assert_eq!(quiz.status, StatusCode::OK);
    assert_eq!(quiz.body["data"]["canPlayMine"], true);
    assert_eq!(quiz.body["data"]["verifiedScore"], 7);
    assert_eq!(quiz.body["data"]["requirement"], 6);
    assert_eq!(quiz.body["message"], "Quiz completed! Mine game unlocked!");

    let start = post(&app, "/mine-game/start", json!({ "sessionId": session_id })).await;
    assert_eq!(start.status, StatusCode::OK);
    assert_eq!(start.body["data"]["config"]["attempts"], 2);
    assert_eq!(start.body["data"]["config"]["mines"], 5);

    assert_eq!(reveal(&app, &session_id, 0, 0, "mine").await.body["data"]["result"], "hit");
    assert_eq!(reveal(&app, &session_id, 1, 1, "mine").await.body["data"]["scoreIncrease"], 100);
    let last = reveal(&app, &session_id, 2, 2, "pro").await;
    assert_eq!(last.body["data"]["result"], "pro_found");
    assert_eq!(last.body["data"]["currentMineScore"], 200);
    assert_eq!(last.body["data"]["currentProScore"], 200);
    assert_eq!(last.body["data"]["totalScore"], 400);
    assert_eq!(last.body["message"], "Cell revealed: pro");

    let finish = post(
        &app,
        "/mine-game/complete",
        json!({ "sessionId": session_id, "finalMineScore": 200, "finalProScore": 200 }),
    )
    .await;
    assert_eq!(finish.status, StatusCode::OK);
    assert_eq!(finish.body["data"]["grandTotal"], 470);
    assert_eq!(finish.body["data"]["quizScore"], 7);
    assert_eq!(finish.body["data"]["statistics"]["minesFound"], 2);
    assert_eq!(finish.body["data"]["statistics"]["prosFound"], 1);
    assert_eq!(finish.body["data"]["statistics"]["totalActions"], 3);

    let after = reveal(&app, &session_id, 0, 1, "blank").await;
    assert_eq!(after.status, StatusCode::CONFLICT);

    let board = send(&app, Method::GET, "/admin/leaderboard", None, true).await;
    assert_eq!(board.status, StatusCode::OK);
    let row = &board.body["data"]["leaderboard"][0];
    assert_eq!(row["teamName"], "Alpha");
    assert_eq!(row["grandTotal"], 470);
    assert_eq!(row["totalScore"], 470);
    assert_eq!(row["status"], "mine_completed");
    assert_eq!(board.body["data"]["summary"]["completedSessions"], 1);

    let teams = send(&app, Method::GET, "/admin/teams", None, true).await;
    assert_eq!(teams.body["data"]["completedTeams"], 1);
    let team = &teams.body["data"]["teams"][0];
    assert_eq!(team["totalScore"], 470);
    assert_eq!(team["questionsCorrect"], 7);
    assert_eq!(team["quizAccuracy"], 88);
    assert_eq!(team["status"], "Completed");
}

#[tokio::test]
async fn team_names_are_unique_ignoring_case() {
    let app = app().await;
    registered_session(&app, "Alpha", "EASY123").await;

    for code in ["HARD789", ADMIN_CODE, "nonsense"] {
        let reply = register(&app, "  aLPHA ", code).await;
        assert_eq!(reply.status, StatusCode::CONFLICT, "code {code}");
        assert_eq!(reply.body["success"], false);
        assert_eq!(reply.body["error"], "TEAM_EXISTS");
    }

    let check = post(
        &app,
        "/teams/validate",
        json!({ "teamName": "ALPHA", "accessCode": "MED456" }),
    )
    .await;
    assert_eq!(check.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn registration_rejects_bad_input() {
    let app = app().await;

    let reply = register(&app, "Bravo", "WRONG").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"], "INVALID_ACCESS_CODE");
    assert_eq!(reply.body["message"], "Invalid access code! Try again.");

    let reply = register(&app, "   ", "EASY123").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"], "VALIDATION_ERROR");
    assert!(reply.body["details"]["teamName"].is_array());

    let reply = register(&app, &"x".repeat(51), "EASY123").await;
    assert_eq!(reply.body["error"], "VALIDATION_ERROR");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/teams/register")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "INVALID_JSON");
}

#[tokio::test]
async fn admin_code_logs_in_without_persisting() {
    let app = app().await;

    let reply = register(&app, "Staff", ADMIN_CODE).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["teamId"], "admin");
    assert_eq!(reply.body["data"]["sessionId"], "admin");
    assert_eq!(reply.body["data"]["difficulty"], "admin");
    assert_eq!(reply.body["message"], "Admin access granted");

    let check = post(
        &app,
        "/teams/validate",
        json!({ "teamName": "Staff", "accessCode": ADMIN_CODE }),
    )
    .await;
    assert_eq!(check.body["data"]["isValid"], true);
    assert_eq!(check.body["data"]["difficulty"], "admin");

    let teams = send(&app, Method::GET, "/admin/teams", None, true).await;
    assert_eq!(teams.body["data"]["totalTeams"], 0);
}

#[tokio::test]
async fn eligibility_follows_the_threshold_table() {
    let app = app().await;
    let cases = [
        ("E5", "EASY123", 5, false),
        ("E6", "EASY123", 6, true),
        ("M4", "MED456", 4, false),
        ("M5", "MED456", 5, true),
        ("H3", "HARD789", 3, false),
        ("H4", "HARD789", 4, true),
    ];

    for (name, code, score, eligible) in cases {
        let session_id = registered_session(&app, name, code).await;
        let reply = complete_quiz(&app, &session_id, score).await;
        assert_eq!(reply.body["data"]["canPlayMine"], eligible, "{name}");
    }
}

#[tokio::test]
async fn ineligible_sessions_cannot_touch_the_mine_game() {
    let app = app().await;
    let session_id = registered_session(&app, "Charlie", "MED456").await;

    let quiz = complete_quiz(&app, &session_id, 4).await;
    assert_eq!(quiz.body["data"]["canPlayMine"], false);
    assert_eq!(
        quiz.body["message"],
        "Quiz completed! Score not sufficient for mine game."
    );

    let start = post(&app, "/mine-game/start", json!({ "sessionId": session_id })).await;
    assert_eq!(start.status, StatusCode::FORBIDDEN);
    assert_eq!(start.body["error"], "NOT_ELIGIBLE");

    assert_eq!(
        reveal(&app, &session_id, 0, 0, "pro").await.status,
        StatusCode::FORBIDDEN
    );

    let finish = post(
        &app,
        "/mine-game/complete",
        json!({ "sessionId": session_id, "finalMineScore": 900, "finalProScore": 900 }),
    )
    .await;
    assert_eq!(finish.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn resubmitted_answers_overwrite_and_keep_the_stored_key() {
    let app = app().await;
    let session_id = registered_session(&app, "Delta", "EASY123").await;

    let first = answer(&app, &session_id, 1, 0, 1).await;
    assert_eq!(first.body["data"]["isCorrect"], false);

    // The stored correct index (1) wins over the resubmitted claim (2).
    let second = answer(&app, &session_id, 1, 1, 2).await;
    assert_eq!(second.body["data"]["isCorrect"], true);

    let quiz = complete_quiz(&app, &session_id, 1).await;
    assert_eq!(quiz.body["data"]["verifiedScore"], 1);

    let again = complete_quiz(&app, &session_id, 8).await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.body["error"], "INVALID_STATE");
}

#[tokio::test]
async fn unknown_sessions_and_difficulties_are_reported() {
    let app = app().await;

    let reply = answer(&app, "nope", 1, 0, 0).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["error"], "SESSION_NOT_FOUND");

    let reply = complete_quiz(&app, "nope", 3).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    let reply = get(&app, "/quiz/questions").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"], "INVALID_DIFFICULTY");

    let reply = get(&app, "/quiz/questions?difficulty=expert").await;
    assert_eq!(reply.body["error"], "INVALID_DIFFICULTY");

    let reply = answer(&app, "nope", 9, 0, 0).await;
    assert_eq!(reply.body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn admin_routes_require_the_admin_header() {
    let app = app().await;

    let missing = send(&app, Method::GET, "/admin/questions", None, false).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.body["message"], "Admin access required");

    let request = Request::builder()
        .uri("/admin/teams")
        .header("x-admin-code", "guess")
        .body(Body::empty())
        .unwrap();
    let wrong = app.clone().oneshot(request).await.unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let open = app_with(AppConfig {
        require_admin_header: false,
        ..test_config()
    })
    .await
    .0;
    let reply = send(&open, Method::GET, "/admin/questions", None, false).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn admin_manages_the_question_bank() {
    let app = app().await;
    let question = json!({
        "difficulty": "medium",
        "questionId": 3,
        "question": "Which tag embeds audio?",
        "options": ["<audio>", "<sound>", "<mp3>", "<music>"],
        "correctAnswer": 0,
    });

    let created = send(&app, Method::POST, "/admin/questions", Some(question.clone()), true).await;
    assert_eq!(created.status, StatusCode::OK);
    assert_eq!(created.body["message"], "Question created successfully");
    let id = created.body["data"]["id"].as_str().unwrap().to_owned();

    let duplicate = send(&app, Method::POST, "/admin/questions", Some(question), true).await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.body["error"], "QUESTION_EXISTS");
    assert_eq!(
        duplicate.body["message"],
        "Question 3 already exists for medium difficulty"
    );

    let updated = send(
        &app,
        Method::PUT,
        "/admin/questions",
        Some(json!({ "_id": id, "questionId": 4, "correctAnswer": 1 })),
        true,
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["data"]["questionId"], 4);
    assert_eq!(updated.body["data"]["correctAnswer"], 1);
    assert_eq!(updated.body["data"]["question"], "Which tag embeds audio?");

    let listed = send(&app, Method::GET, "/admin/questions?difficulty=medium", None, true).await;
    assert_eq!(listed.body["data"]["total"], 1);
    let ignored = send(&app, Method::GET, "/admin/questions?difficulty=bogus", None, true).await;
    assert_eq!(ignored.body["data"]["total"], 1);

    let missing = send(&app, Method::DELETE, "/admin/questions", None, true).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["error"], "MISSING_ID");

    let malformed = send(&app, Method::DELETE, "/admin/questions?id=xyz", None, true).await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);

    let uri = format!("/admin/questions?id={id}");
    let deleted = send(&app, Method::DELETE, &uri, None, true).await;
    assert_eq!(deleted.status, StatusCode::OK);
    let gone = send(&app, Method::DELETE, &uri, None, true).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.body["error"], "QUESTION_NOT_FOUND");
}

#[tokio::test]
async fn admin_generates_templates_without_storing_them() {
    let app = app().await;
    let reply = send(
        &app,
        Method::POST,
        "/admin/questions/generate",
        Some(json!({ "difficulty": "easy" })),
        true,
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["questions"].as_array().unwrap().len(), 5);
    assert_eq!(
        reply.body["data"]["questions"][0]["question"],
        "What does CSS stand for?"
    );

    let listed = send(&app, Method::GET, "/admin/questions", None, true).await;
    assert_eq!(listed.body["data"]["total"], 0);
}

#[tokio::test]
async fn timers_feed_the_quiz_time_limit() {
    let app = app().await;

    let defaults = send(&app, Method::GET, "/admin/timers", None, true).await;
    assert_eq!(defaults.body["data"]["hard"], 300);

    let too_short = send(
        &app,
        Method::PUT,
        "/admin/timers",
        Some(json!({ "easy": 10, "medium": 300, "hard": 600 })),
        true,
    )
    .await;
    assert_eq!(too_short.status, StatusCode::BAD_REQUEST);

    let saved = send(
        &app,
        Method::PUT,
        "/admin/timers",
        Some(json!({ "easy": 120, "medium": 300, "hard": 600 })),
        true,
    )
    .await;
    assert_eq!(saved.status, StatusCode::OK);

    let quiz = get(&app, "/quiz/questions?difficulty=hard").await;
    assert_eq!(quiz.body["data"]["timeLimitSeconds"], 600);
}

#[tokio::test]
async fn admin_team_lookup() {
    let app = app().await;
    registered_session(&app, "Echo", "HARD789").await;

    let found = send(
        &app,
        Method::POST,
        "/admin/teams",
        Some(json!({ "teamName": "echo" })),
        true,
    )
    .await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body["data"]["teamName"], "Echo");
    assert_eq!(found.body["data"]["status"], "In Progress");

    let neither = send(&app, Method::POST, "/admin/teams", Some(json!({})), true).await;
    assert_eq!(neither.status, StatusCode::BAD_REQUEST);
    assert_eq!(neither.body["error"], "INVALID_REQUEST");

    let unknown = send(
        &app,
        Method::POST,
        "/admin/teams",
        Some(json!({ "teamId": "00000000-0000-0000-0000-000000000000" })),
        true,
    )
    .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.body["error"], "TEAM_NOT_FOUND");
}

#[tokio::test]
async fn analytics_reports_the_selected_window() {
    let app = app().await;
    let session_id = registered_session(&app, "Foxtrot", "EASY123").await;
    complete_quiz(&app, &session_id, 6).await;

    let report = send(
        &app,
        Method::GET,
        "/admin/analytics?timeRange=1h&difficulty=easy",
        None,
        true,
    )
    .await;
    assert_eq!(report.status, StatusCode::OK);
    assert_eq!(report.body["data"]["overview"]["totalSessions"], 1);
    assert_eq!(report.body["data"]["overview"]["completedQuizzes"], 1);
    assert_eq!(report.body["data"]["difficultyDistribution"]["easy"], 1);
    assert_eq!(report.body["data"]["filters"]["timeRange"], "1h");

    let invalid = send(&app, Method::GET, "/admin/analytics?timeRange=2y", None, true).await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn degraded_mode_answers_503() {
    let state = AppState::new(test_config());
    let app = routes::router(state);

    let reply = get(&app, "/quiz/questions?difficulty=easy").await;
    assert_eq!(reply.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(reply.body["error"], "SERVICE_UNAVAILABLE");

    let health = get(&app, "/health").await;
    assert_eq!(health.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health.body["success"], false);
    assert_eq!(health.body["data"]["status"], "degraded");
}

#[tokio::test]
async fn health_reports_counts() {
    let app = app().await;
    registered_session(&app, "Golf", "EASY123").await;

    let health = get(&app, "/health").await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["data"]["status"], "healthy");
    assert_eq!(health.body["data"]["checks"]["database"]["status"], "healthy");

    let detailed = send(&app, Method::POST, "/health", None, false).await;
    assert_eq!(detailed.status, StatusCode::OK);
    let collections = &detailed.body["data"]["database"]["collections"];
    assert_eq!(collections["teams"], 1);
    assert_eq!(collections["activeSessions"], 1);
    assert_eq!(detailed.body["data"]["database"]["recentActivity"][0]["teamName"], "Golf");
}

#[tokio::test]
async fn callers_over_the_limit_get_429() {
    let (app, _state) = app_with(AppConfig {
        rate_limit_max_requests: 2,
        ..test_config()
    })
    .await;

    let first = get(&app, "/health").await;
    assert_eq!(first.headers["x-ratelimit-limit"], "2");
    assert_eq!(first.headers["x-ratelimit-remaining"], "1");
    assert!(first.headers.contains_key("x-ratelimit-reset"));
    get(&app, "/health").await;

    let limited = get(&app, "/health").await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.body["error"], "RATE_LIMIT_EXCEEDED");
    assert!(limited.body["details"]["retryAfter"].as_u64().unwrap() > 0);
    assert!(limited.headers.contains_key("retry-after"));
    assert_eq!(limited.headers["x-ratelimit-remaining"], "0");
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let app = app().await;
    let reply = get(&app, "/health").await;
    assert_eq!(reply.headers["x-content-type-options"], "nosniff");
    assert_eq!(reply.headers["x-frame-options"], "DENY");
    assert_eq!(
        reply.headers["referrer-policy"],
        "strict-origin-when-cross-origin"
    );
    assert_eq!(reply.headers["x-xss-protection"], "1; mode=block");
    assert_eq!(
        reply.headers["permissions-policy"],
        "camera=(), microphone=(), geolocation=()"
    );
    assert_eq!(
        reply.headers["strict-transport-security"],
        "max-age=31536000; includeSubDomains"
    );

    let denied = get(&app, "/admin/teams").await;
    assert_eq!(denied.status, StatusCode::UNAUTHORIZED);
    assert_eq!(denied.headers["x-xss-protection"], "1; mode=block");
}

#[tokio::test]
async fn development_mode_skips_hsts() {
    let app = app_with(AppConfig {
        development: true,
        ..test_config()
    })
    .await
    .0;
    let reply = get(&app, "/health").await;
    assert!(!reply.headers.contains_key("strict-transport-security"));
    assert_eq!(reply.headers["x-frame-options"], "DENY");
}

#[tokio::test]
async fn oversized_mine_totals_are_rejected() {
    let app = app().await;
    let session_id = registered_session(&app, "Hotel", "EASY123").await;
    complete_quiz(&app, &session_id, 8).await;

    for (mine, pro) in [(u64::from(u32::MAX), 0), (0, u64::from(u32::MAX)), (1_801, 0)] {
        let reply = post(
            &app,
            "/mine-game/complete",
            json!({ "sessionId": session_id, "finalMineScore": mine, "finalProScore": pro }),
        )
        .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{mine}/{pro}");
        assert_eq!(reply.body["error"], "VALIDATION_ERROR");
    }

    let finish = post(
        &app,
        "/mine-game/complete",
        json!({ "sessionId": session_id, "finalMineScore": 1_800, "finalProScore": 1_800 }),
    )
    .await;
    assert_eq!(finish.status, StatusCode::OK);
    assert_eq!(finish.body["data"]["grandTotal"], 3_680);
}
