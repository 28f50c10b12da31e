use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, put},
    Router,
};

use shared_utils::extractor::{auth_middleware, require_admin};
use shared_utils::AppState;

use crate::handlers;

/// Routes for admins, mounted under `/api/admin`.
pub fn admin_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/doctors/pending", get(handlers::get_pending_doctors))
        .route("/doctors", get(handlers::get_all_doctors))
        .route("/doctors/{doctor_id}/approve", put(handlers::approve_doctor))
        .route("/doctors/{doctor_id}/block", put(handlers::block_doctor))
        .route("/users", get(handlers::get_all_users))
        .route("/users/{user_id}", delete(handlers::delete_user))
        .route("/appointments", get(handlers::get_all_appointments))
        .route("/statistics", get(handlers::get_statistics))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
