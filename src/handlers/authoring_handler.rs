use actix_web::{delete, get, patch, post, put, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::ActingUser,
    errors::AppError,
    models::dto::{
        request::{EditorCommand, OpenAuthoringRequest, QuizSettingsRequest, SubmitQuizRequest},
        response::MessageResponse,
    },
};

#[post("/api/authoring")]
async fn open_authoring(
    state: web::Data<AppState>,
    request: web::Json<OpenAuthoringRequest>,
    user: ActingUser,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let view = state
        .authoring_service
        .open(user.id(), &request.source_file_id)
        .await?;
    Ok(HttpResponse::Created().json(view))
}

#[get("/api/authoring/{id}")]
async fn get_authoring(
    state: web::Data<AppState>,
    id: web::Path<String>,
    user: ActingUser,
) -> Result<HttpResponse, AppError> {
    let view = state.authoring_service.view(&id, user.id()).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[patch("/api/authoring/{id}/questions")]
async fn edit_questions(
    state: web::Data<AppState>,
    id: web::Path<String>,
    command: web::Json<EditorCommand>,
    user: ActingUser,
) -> Result<HttpResponse, AppError> {
    let view = state
        .authoring_service
        .apply(&id, user.id(), command.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

#[put("/api/authoring/{id}/settings")]
async fn update_settings(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<QuizSettingsRequest>,
    user: ActingUser,
) -> Result<HttpResponse, AppError> {
    request.validate()?;
    let view = state
        .authoring_service
        .update_settings(&id, user.id(), request.into_inner().into())
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

#[post("/api/authoring/{id}/questions/{index}/save")]
async fn save_question(
    state: web::Data<AppState>,
    path: web::Path<(String, usize)>,
    user: ActingUser,
) -> Result<HttpResponse, AppError> {
    let (id, index) = path.into_inner();
    let view = state
        .authoring_service
        .save_question(&id, user.id(), index)
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

#[post("/api/authoring/{id}/generate")]
async fn generate_questions(
    state: web::Data<AppState>,
    id: web::Path<String>,
    user: ActingUser,
) -> Result<HttpResponse, AppError> {
    let view = state.authoring_service.generate(&id, user.id()).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[post("/api/authoring/{id}/submit")]
async fn submit_quiz(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: Option<web::Json<SubmitQuizRequest>>,
    user: ActingUser,
) -> Result<HttpResponse, AppError> {
    let request = request.map(|r| r.into_inner()).unwrap_or_default();
    let outcome = state
        .authoring_service
        .submit(&id, user.id(), request.draft)
        .await?;
    Ok(HttpResponse::Created().json(outcome))
}

#[delete("/api/authoring/{id}")]
async fn discard_authoring(
    state: web::Data<AppState>,
    id: web::Path<String>,
    user: ActingUser,
) -> Result<HttpResponse, AppError> {
    state.authoring_service.discard(&id, user.id()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Authoring session discarded".to_string(),
    }))
}
