use actix_web::{get, web, HttpResponse};

use crate::app_state::AppState;

#[get("/health")]
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let store = match &state.db {
        Some(db) => db.health_check().await.is_ok(),
        None => true,
    };

    let response = serde_json::json!({
        "status": if store { "healthy" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "dependencies": {
            "mongodb": if store { "ok" } else { "error" }
        }
    });

    if store {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}
