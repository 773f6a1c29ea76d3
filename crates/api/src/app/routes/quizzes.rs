use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, rejection::{JsonRejection, QueryRejection}},
    response::Response,
    routing::{get, post},
    Json, Router,
};

use lifetip_core::QuizId;
use lifetip_quizzes::NewQuiz;

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn public() -> Router {
    Router::new()
        .route("/api/v1/quizzes", get(list_quizzes))
        .route("/api/v1/quizzes/:id", get(get_quiz))
}

pub fn protected() -> Router {
    Router::new()
        .route("/api/v1/quizzes", post(create_quiz))
        .route("/api/v1/quizzes/:id/answer", post(answer_quiz))
}

pub async fn list_quizzes(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::PageQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let quizzes = services.list_quizzes(query.page()).await?;
    Ok(dto::ok(
        quizzes.iter().map(dto::quiz_to_json).collect::<Vec<_>>(),
    ))
}

pub async fn get_quiz(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let quiz_id: QuizId = dto::parse_id(&id)?;
    let quiz = services.get_quiz(quiz_id).await?;
    Ok(dto::ok(dto::quiz_to_json(&quiz)))
}

pub async fn create_quiz(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::CreateQuizRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let new = NewQuiz::new(
        &body.question,
        &body.choices,
        body.answer_index,
        body.explanation.as_deref(),
    )?;
    let quiz = services.create_quiz(new).await?;
    Ok(dto::created(dto::quiz_to_json(&quiz)))
}

pub async fn answer_quiz(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<dto::AnswerQuizRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let quiz_id: QuizId = dto::parse_id(&id)?;
    let Json(body) = body?;
    let grade = services.answer_quiz(quiz_id, body.choice).await?;
    Ok(dto::ok(dto::grade_to_json(&grade)))
}
