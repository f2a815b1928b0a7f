use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};

use crate::{
    dto::{
        ApiResponse,
        admin::{
            AnalyticsQuery, AnalyticsResponse, CreateQuestionRequest, DeleteQuestionQuery,
            DeletedQuestionResponse, DifficultyFilter, GenerateQuestionsRequest,
            GeneratedQuestionsResponse, LeaderboardQuery, LeaderboardResponse,
            QuestionListResponse, QuestionView, TeamLookupRequest, TeamView, TeamsOverview,
            TimerSettingsView, UpdateQuestionRequest, UpdateTimersRequest,
        },
    },
    error::AppError,
    routes::extract::{ValidJson, ValidQuery},
    services::{admin_service, analytics_service},
    state::SharedState,
};

/// Header carrying the admin access code.
pub const ADMIN_CODE_HEADER: &str = "x-admin-code";

/// Admin-only endpoints for the question bank, timers, teams and reports.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route(
            "/admin/questions",
            get(list_questions)
                .post(create_question)
                .put(update_question)
                .delete(delete_question),
        )
        .route("/admin/questions/generate", post(generate_questions))
        .route("/admin/timers", get(get_timers).put(update_timers))
        .route("/admin/teams", get(list_teams).post(lookup_team))
        .route("/admin/leaderboard", get(get_leaderboard))
        .route("/admin/analytics", get(get_analytics))
        .route_layer(middleware::from_fn_with_state(state, require_admin_code))
}

/// List the question bank, optionally for one difficulty.
#[utoipa::path(
    get,
    path = "/admin/questions",
    tag = "admin",
    params(
        ("x-admin-code" = String, Header, description = "Admin access code"),
        DifficultyFilter
    ),
    responses((status = 200, description = "Questions ordered by difficulty then slot", body = ApiResponse<QuestionListResponse>))
)]
pub async fn list_questions(
    State(state): State<SharedState>,
    ValidQuery(filter): ValidQuery<DifficultyFilter>,
) -> Result<Json<ApiResponse<QuestionListResponse>>, AppError> {
    let questions = admin_service::list_questions(&state, filter.difficulty.as_deref()).await?;
    Ok(Json(ApiResponse::ok(questions)))
}

/// Add a question to a free slot.
#[utoipa::path(
    post,
    path = "/admin/questions",
    tag = "admin",
    params(("x-admin-code" = String, Header, description = "Admin access code")),
    request_body = CreateQuestionRequest,
    responses(
        (status = 200, description = "Question created", body = ApiResponse<QuestionView>),
        (status = 409, description = "Slot already taken")
    )
)]
pub async fn create_question(
    State(state): State<SharedState>,
    ValidJson(payload): ValidJson<CreateQuestionRequest>,
) -> Result<Json<ApiResponse<QuestionView>>, AppError> {
    let question = admin_service::create_question(&state, payload).await?;
    Ok(Json(ApiResponse::with_message(
        question,
        "Question created successfully",
    )))
}

/// Update a stored question.
#[utoipa::path(
    put,
    path = "/admin/questions",
    tag = "admin",
    params(("x-admin-code" = String, Header, description = "Admin access code")),
    request_body = UpdateQuestionRequest,
    responses(
        (status = 200, description = "Question updated", body = ApiResponse<QuestionView>),
        (status = 404, description = "Unknown question"),
        (status = 409, description = "Target slot already taken")
    )
)]
pub async fn update_question(
    State(state): State<SharedState>,
    ValidJson(payload): ValidJson<UpdateQuestionRequest>,
) -> Result<Json<ApiResponse<QuestionView>>, AppError> {
    let question = admin_service::update_question(&state, payload).await?;
    Ok(Json(ApiResponse::with_message(
        question,
        "Question updated successfully",
    )))
}

/// Remove a question by id.
#[utoipa::path(
    delete,
    path = "/admin/questions",
    tag = "admin",
    params(
        ("x-admin-code" = String, Header, description = "Admin access code"),
        DeleteQuestionQuery
    ),
    responses(
        (status = 200, description = "Question deleted", body = ApiResponse<DeletedQuestionResponse>),
        (status = 400, description = "Missing or malformed id"),
        (status = 404, description = "Unknown question")
    )
)]
pub async fn delete_question(
    State(state): State<SharedState>,
    ValidQuery(query): ValidQuery<DeleteQuestionQuery>,
) -> Result<Json<ApiResponse<DeletedQuestionResponse>>, AppError> {
    let deleted = admin_service::delete_question(&state, query.id.as_deref()).await?;
    Ok(Json(ApiResponse::with_message(
        deleted,
        "Question deleted successfully",
    )))
}

/// Propose template questions for a difficulty. Nothing is stored.
#[utoipa::path(
    post,
    path = "/admin/questions/generate",
    tag = "admin",
    params(("x-admin-code" = String, Header, description = "Admin access code")),
    request_body = GenerateQuestionsRequest,
    responses((status = 200, description = "Generated proposals", body = ApiResponse<GeneratedQuestionsResponse>))
)]
pub async fn generate_questions(
    State(state): State<SharedState>,
    ValidJson(payload): ValidJson<GenerateQuestionsRequest>,
) -> Result<Json<ApiResponse<GeneratedQuestionsResponse>>, AppError> {
    let generated = admin_service::generate_questions(&state, payload.difficulty).await;
    Ok(Json(ApiResponse::with_message(
        generated,
        "Questions generated successfully",
    )))
}

/// Current quiz time limits.
#[utoipa::path(
    get,
    path = "/admin/timers",
    tag = "admin",
    params(("x-admin-code" = String, Header, description = "Admin access code")),
    responses((status = 200, description = "Timer settings", body = ApiResponse<TimerSettingsView>))
)]
pub async fn get_timers(
    State(state): State<SharedState>,
) -> Result<Json<ApiResponse<TimerSettingsView>>, AppError> {
    Ok(Json(ApiResponse::ok(
        admin_service::timer_settings(&state).await?,
    )))
}

/// Replace the quiz time limits.
#[utoipa::path(
    put,
    path = "/admin/timers",
    tag = "admin",
    params(("x-admin-code" = String, Header, description = "Admin access code")),
    request_body = UpdateTimersRequest,
    responses(
        (status = 200, description = "Timer settings saved", body = ApiResponse<TimerSettingsView>),
        (status = 400, description = "Limit outside 30..=3600 seconds")
    )
)]
pub async fn update_timers(
    State(state): State<SharedState>,
    ValidJson(payload): ValidJson<UpdateTimersRequest>,
) -> Result<Json<ApiResponse<TimerSettingsView>>, AppError> {
    let timers = admin_service::update_timer_settings(&state, payload).await?;
    Ok(Json(ApiResponse::with_message(
        timers,
        "Timer settings saved",
    )))
}

/// Every team with completion partitions.
#[utoipa::path(
    get,
    path = "/admin/teams",
    tag = "admin",
    params(("x-admin-code" = String, Header, description = "Admin access code")),
    responses((status = 200, description = "Teams overview", body = ApiResponse<TeamsOverview>))
)]
pub async fn list_teams(
    State(state): State<SharedState>,
) -> Result<Json<ApiResponse<TeamsOverview>>, AppError> {
    Ok(Json(ApiResponse::ok(
        admin_service::teams_overview(&state).await?,
    )))
}

/// Look one team up by name or id.
#[utoipa::path(
    post,
    path = "/admin/teams",
    tag = "admin",
    params(("x-admin-code" = String, Header, description = "Admin access code")),
    request_body = TeamLookupRequest,
    responses(
        (status = 200, description = "Team found", body = ApiResponse<TeamView>),
        (status = 400, description = "Neither teamName nor teamId given"),
        (status = 404, description = "Unknown team")
    )
)]
pub async fn lookup_team(
    State(state): State<SharedState>,
    ValidJson(payload): ValidJson<TeamLookupRequest>,
) -> Result<Json<ApiResponse<TeamView>>, AppError> {
    Ok(Json(ApiResponse::ok(
        admin_service::lookup_team(&state, payload).await?,
    )))
}

/// Ranked sessions joined with teams and game logs.
#[utoipa::path(
    get,
    path = "/admin/leaderboard",
    tag = "admin",
    params(
        ("x-admin-code" = String, Header, description = "Admin access code"),
        LeaderboardQuery
    ),
    responses((status = 200, description = "Leaderboard", body = ApiResponse<LeaderboardResponse>))
)]
pub async fn get_leaderboard(
    State(state): State<SharedState>,
    ValidQuery(query): ValidQuery<LeaderboardQuery>,
) -> Result<Json<ApiResponse<LeaderboardResponse>>, AppError> {
    let board = analytics_service::leaderboard(
        &state,
        query.difficulty.as_deref(),
        query.sort_by,
        query.limit,
    )
    .await?;
    Ok(Json(ApiResponse::ok(board)))
}

/// Aggregated statistics over a time window.
#[utoipa::path(
    get,
    path = "/admin/analytics",
    tag = "admin",
    params(
        ("x-admin-code" = String, Header, description = "Admin access code"),
        AnalyticsQuery
    ),
    responses((status = 200, description = "Analytics report", body = ApiResponse<AnalyticsResponse>))
)]
pub async fn get_analytics(
    State(state): State<SharedState>,
    ValidQuery(query): ValidQuery<AnalyticsQuery>,
) -> Result<Json<ApiResponse<AnalyticsResponse>>, AppError> {
    let report =
        analytics_service::analytics(&state, query.time_range, query.difficulty.as_deref()).await?;
    Ok(Json(ApiResponse::ok(report)))
}

async fn require_admin_code(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let config = state.config();
    if !config.require_admin_header {
        return Ok(next.run(req).await);
    }

    let authorized = req
        .headers()
        .get(ADMIN_CODE_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|code| code == config.admin_access_code);

    if authorized {
        Ok(next.run(req).await)
    } else {
        Err(AppError::Unauthorized("Admin access required".into()))
    }
}
