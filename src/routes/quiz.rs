use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::{
        ApiResponse,
        quiz::{
            CompleteQuizRequest, CompleteQuizResponse, QuestionsQuery, QuestionsResponse,
            SubmitAnswerRequest, SubmitAnswerResponse,
        },
    },
    error::AppError,
    routes::extract::{ValidJson, ValidQuery},
    services::quiz_service,
    state::SharedState,
};

/// Quiz round endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/quiz/questions", get(get_questions))
        .route("/quiz/submit-answer", post(submit_answer))
        .route("/quiz/complete", post(complete_quiz))
}

/// Questions of a difficulty, seeding the default bank on first use.
#[utoipa::path(
    get,
    path = "/quiz/questions",
    tag = "quiz",
    params(QuestionsQuery),
    responses(
        (status = 200, description = "Questions ordered by slot", body = ApiResponse<QuestionsResponse>),
        (status = 400, description = "Missing or unknown difficulty")
    )
)]
pub async fn get_questions(
    State(state): State<SharedState>,
    ValidQuery(query): ValidQuery<QuestionsQuery>,
) -> Result<Json<ApiResponse<QuestionsResponse>>, AppError> {
    let questions = quiz_service::questions(&state, query.difficulty.as_deref()).await?;
    Ok(Json(ApiResponse::ok(questions)))
}

/// Record (or overwrite) the answer to one question.
#[utoipa::path(
    post,
    path = "/quiz/submit-answer",
    tag = "quiz",
    request_body = SubmitAnswerRequest,
    responses(
        (status = 200, description = "Answer stored", body = ApiResponse<SubmitAnswerResponse>),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    ValidJson(payload): ValidJson<SubmitAnswerRequest>,
) -> Result<Json<ApiResponse<SubmitAnswerResponse>>, AppError> {
    let answer = quiz_service::submit_answer(&state, payload).await?;
    Ok(Json(ApiResponse::with_message(
        answer,
        "Answer submitted successfully",
    )))
}

/// Close the quiz and fix mine game eligibility.
#[utoipa::path(
    post,
    path = "/quiz/complete",
    tag = "quiz",
    request_body = CompleteQuizRequest,
    responses(
        (status = 200, description = "Quiz completed", body = ApiResponse<CompleteQuizResponse>),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Quiz already completed")
    )
)]
pub async fn complete_quiz(
    State(state): State<SharedState>,
    ValidJson(payload): ValidJson<CompleteQuizRequest>,
) -> Result<Json<ApiResponse<CompleteQuizResponse>>, AppError> {
    let result = quiz_service::complete(&state, payload).await?;
    let message = if result.can_play_mine {
        "Quiz completed! Mine game unlocked!"
    } else {
        "Quiz completed! Score not sufficient for mine game."
    };
    Ok(Json(ApiResponse::with_message(result, message)))
}
