use std::sync::Arc;

use axum::{http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde_json::{json, Value};

use admin_cell::admin_routes;
use auth_cell::router::auth_routes;
use doctor_cell::router::doctor_routes;
use patient_cell::router::patient_routes;
use shared_utils::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/api/health", get(health))
        .nest("/api/auth", auth_routes(state.clone()))
        .nest("/api/patient", patient_routes(state.clone()))
        .nest("/api/doctor", doctor_routes(state.clone()))
        .nest("/api/admin", admin_routes(state))
        .fallback(not_found)
}

async fn welcome() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Welcome to MediConnect API",
        "version": "1.0.0"
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "MediConnect API is running",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": "Route not found"
        })),
    )
}
