use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use shared_utils::extractor::{auth_middleware, require_doctor};
use shared_utils::AppState;

use crate::handlers;

/// Routes for doctor-role users, mounted under `/api/doctor`.
pub fn doctor_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/profile",
            get(handlers::get_profile)
                .post(handlers::create_profile)
                .put(handlers::update_profile),
        )
        .route("/appointments", get(handlers::get_appointments))
        .route("/appointments/{appointment_id}/accept", put(handlers::accept_appointment))
        .route("/appointments/{appointment_id}/reject", put(handlers::reject_appointment))
        .route("/history", get(handlers::get_history))
        .layer(middleware::from_fn(require_doctor))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
