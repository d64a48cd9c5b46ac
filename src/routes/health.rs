use actix_web::{get, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

#[get("/")]
pub async fn root() -> impl Responder {
    HttpResponse::Ok().json(json!({ "message": "Task Manager API" }))
}

/// Health check endpoint
///
/// Returns the current status of the API and timestamp.
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "timestamp": Utc::now()
    }))
}
