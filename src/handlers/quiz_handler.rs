use actix_web::{get, web, HttpResponse};

use crate::{
    app_state::AppState, auth::ActingUser, errors::AppError, models::dto::response::QuizPreview,
};

/// Owners get the full quiz; everyone else gets it without correct answers or explanations.
#[get("/api/quizzes/{id}")]
async fn get_quiz(
    state: web::Data<AppState>,
    id: web::Path<String>,
    user: ActingUser,
) -> Result<HttpResponse, AppError> {
    let quiz = state.quiz_service.get_quiz_with_questions(&id).await?;
    if quiz.quiz.owner_id == user.id() {
        return Ok(HttpResponse::Ok().json(quiz));
    }
    Ok(HttpResponse::Ok().json(QuizPreview::from(quiz)))
}

#[get("/api/files/{file_id}/quizzes")]
async fn list_quizzes_for_file(
    state: web::Data<AppState>,
    file_id: web::Path<String>,
    _user: ActingUser,
) -> Result<HttpResponse, AppError> {
    let quizzes = state.quiz_service.list_quizzes_for_file(&file_id).await?;
    Ok(HttpResponse::Ok().json(quizzes))
}
