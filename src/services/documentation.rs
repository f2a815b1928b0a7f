use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Arcade Quiz Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::health::detailed_healthcheck,
        crate::routes::teams::register_team,
        crate::routes::teams::validate_team,
        crate::routes::quiz::get_questions,
        crate::routes::quiz::submit_answer,
        crate::routes::quiz::complete_quiz,
        crate::routes::mine_game::start_mine_game,
        crate::routes::mine_game::reveal_cell,
        crate::routes::mine_game::complete_mine_game,
        crate::routes::admin::list_questions,
        crate::routes::admin::create_question,
        crate::routes::admin::update_question,
        crate::routes::admin::delete_question,
        crate::routes::admin::generate_questions,
        crate::routes::admin::get_timers,
        crate::routes::admin::update_timers,
        crate::routes::admin::list_teams,
        crate::routes::admin::lookup_team,
        crate::routes::admin::get_leaderboard,
        crate::routes::admin::get_analytics,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::DetailedHealthResponse,
            crate::dto::team::TeamCredentials,
            crate::dto::team::RegistrationResponse,
            crate::dto::team::CredentialCheckResponse,
            crate::dto::quiz::QuestionsResponse,
            crate::dto::quiz::SubmitAnswerRequest,
            crate::dto::quiz::SubmitAnswerResponse,
            crate::dto::quiz::CompleteQuizRequest,
            crate::dto::quiz::CompleteQuizResponse,
            crate::dto::mine::StartMineRequest,
            crate::dto::mine::StartMineResponse,
            crate::dto::mine::MineActionRequest,
            crate::dto::mine::MineActionResponse,
            crate::dto::mine::CompleteMineRequest,
            crate::dto::mine::CompleteMineResponse,
            crate::dto::admin::QuestionListResponse,
            crate::dto::admin::CreateQuestionRequest,
            crate::dto::admin::UpdateQuestionRequest,
            crate::dto::admin::GenerateQuestionsRequest,
            crate::dto::admin::GeneratedQuestionsResponse,
            crate::dto::admin::TimerSettingsView,
            crate::dto::admin::UpdateTimersRequest,
            crate::dto::admin::TeamsOverview,
            crate::dto::admin::TeamLookupRequest,
            crate::dto::admin::LeaderboardResponse,
            crate::dto::admin::AnalyticsResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "teams", description = "Team registration"),
        (name = "quiz", description = "Quiz round"),
        (name = "mine-game", description = "Mine hunter reveal game"),
        (name = "admin", description = "Question bank, timers, teams and reporting"),
    )
)]
pub struct ApiDoc;
