use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use shared_utils::extractor::{auth_middleware, require_patient};
use shared_utils::AppState;

use crate::handlers::*;

/// Routes for patient-role users, mounted under `/api/patient`.
pub fn patient_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/doctors", get(get_doctors))
        .route("/doctors/{doctor_id}/booked-slots", get(get_booked_slots))
        .route("/doctors/{doctor_id}/slots", get(get_available_slots))
        .route("/appointments", get(get_my_appointments).post(book_appointment))
        .route("/appointments/{appointment_id}/cancel", put(cancel_appointment))
        .route("/profile", get(get_profile).put(update_profile))
        .layer(middleware::from_fn(require_patient))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
