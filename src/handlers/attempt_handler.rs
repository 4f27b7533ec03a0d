use actix_web::{delete, get, post, put, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::ActingUser,
    errors::AppError,
    models::dto::{request::AnswerRequest, response::MessageResponse},
};

#[post("/api/quizzes/{id}/attempts")]
async fn start_attempt(
    state: web::Data<AppState>,
    quiz_id: web::Path<String>,
    user: ActingUser,
) -> Result<HttpResponse, AppError> {
    let view = state.attempt_service.start(user.id(), &quiz_id).await?;
    Ok(HttpResponse::Created().json(view))
}

#[get("/api/quizzes/{id}/attempts/history")]
async fn attempt_history(
    state: web::Data<AppState>,
    quiz_id: web::Path<String>,
    user: ActingUser,
) -> Result<HttpResponse, AppError> {
    let history = state.attempt_service.history(user.id(), &quiz_id).await?;
    Ok(HttpResponse::Ok().json(history))
}

#[get("/api/attempts/{id}")]
async fn get_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    user: ActingUser,
) -> Result<HttpResponse, AppError> {
    let view = state.attempt_service.view(&id, user.id()).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[put("/api/attempts/{id}/answer")]
async fn select_answer(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<AnswerRequest>,
    user: ActingUser,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let view = state
        .attempt_service
        .select_answer(&id, user.id(), &request.question_id, &request.value)
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

#[post("/api/attempts/{id}/toggle")]
async fn toggle_answer(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<AnswerRequest>,
    user: ActingUser,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let view = state
        .attempt_service
        .toggle_answer(&id, user.id(), &request.question_id, &request.value)
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

#[post("/api/attempts/{id}/advance")]
async fn advance_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    user: ActingUser,
) -> Result<HttpResponse, AppError> {
    let view = state.attempt_service.advance(&id, user.id()).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[get("/api/attempts/{id}/results")]
async fn attempt_results(
    state: web::Data<AppState>,
    id: web::Path<String>,
    user: ActingUser,
) -> Result<HttpResponse, AppError> {
    let results = state.attempt_service.results(&id, user.id()).await?;
    Ok(HttpResponse::Ok().json(results))
}

#[post("/api/attempts/{id}/retry")]
async fn retry_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    user: ActingUser,
) -> Result<HttpResponse, AppError> {
    let view = state.attempt_service.retry(&id, user.id()).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[delete("/api/attempts/{id}")]
async fn exit_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    user: ActingUser,
) -> Result<HttpResponse, AppError> {
    state.attempt_service.exit(&id, user.id()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Attempt closed".to_string(),
    }))
}
