pub mod attempt_handler;
pub mod authoring_handler;
pub mod health_handler;
pub mod quiz_handler;

use actix_web::web;

pub use attempt_handler::{
    advance_attempt, attempt_history, attempt_results, exit_attempt, get_attempt, retry_attempt,
    select_answer, start_attempt, toggle_answer,
};
pub use authoring_handler::{
    discard_authoring, edit_questions, generate_questions, get_authoring, open_authoring,
    save_question, submit_quiz, update_settings,
};
pub use health_handler::health_check;
pub use quiz_handler::{get_quiz, list_quizzes_for_file};

/// Registers every route on the app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(open_authoring)
        .service(get_authoring)
        .service(edit_questions)
        .service(update_settings)
        .service(save_question)
        .service(generate_questions)
        .service(submit_quiz)
        .service(discard_authoring)
        .service(attempt_history)
        .service(get_quiz)
        .service(list_quizzes_for_file)
        .service(start_attempt)
        .service(get_attempt)
        .service(select_answer)
        .service(toggle_answer)
        .service(advance_attempt)
        .service(attempt_results)
        .service(retry_attempt)
        .service(exit_attempt);
}
