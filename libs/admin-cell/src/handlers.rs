use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};

use appointment_cell::models::parse_id;
use appointment_cell::AppointmentBookingService;
use doctor_cell::DoctorService;
use shared_database::AppointmentFilter;
use shared_models::error::AppError;
use shared_models::{AuthUser, DoctorStatus, UserProfile};
use shared_utils::AppState;

use crate::services::admin::AdminService;

// ==============================================================================
// DOCTOR MANAGEMENT
// ==============================================================================

#[axum::debug_handler]
pub async fn get_pending_doctors(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let doctors = DoctorService::new(state.store.clone())
        .list_doctors(Some(DoctorStatus::Pending))
        .await?;

    Ok(Json(json!({
        "success": true,
        "count": doctors.len(),
        "doctors": doctors
    })))
}

#[axum::debug_handler]
pub async fn get_all_doctors(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let doctors = DoctorService::new(state.store.clone()).list_doctors(None).await?;

    Ok(Json(json!({
        "success": true,
        "count": doctors.len(),
        "doctors": doctors
    })))
}

#[axum::debug_handler]
pub async fn approve_doctor(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = parse_id(&doctor_id)?;
    let doctor = DoctorService::new(state.store.clone())
        .set_status(doctor_id, DoctorStatus::Approved)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor approved successfully",
        "doctor": doctor
    })))
}

#[axum::debug_handler]
pub async fn block_doctor(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = parse_id(&doctor_id)?;
    let doctor = DoctorService::new(state.store.clone())
        .set_status(doctor_id, DoctorStatus::Blocked)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor blocked successfully",
        "doctor": doctor
    })))
}

// ==============================================================================
// USER MANAGEMENT
// ==============================================================================

#[axum::debug_handler]
pub async fn get_all_users(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let users: Vec<UserProfile> = AdminService::new(state.store.clone())
        .list_users()
        .await?
        .iter()
        .map(UserProfile::from)
        .collect();

    Ok(Json(json!({
        "success": true,
        "count": users.len(),
        "users": users
    })))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let user_id = parse_id(&user_id)?;
    AdminService::new(state.store.clone()).delete_user(&admin, user_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "User deleted successfully"
    })))
}

// ==============================================================================
// OVERSIGHT
// ==============================================================================

#[axum::debug_handler]
pub async fn get_all_appointments(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let appointments = AppointmentBookingService::new(state.store.clone())
        .list_appointments(&AppointmentFilter::default())
        .await?;

    Ok(Json(json!({
        "success": true,
        "count": appointments.len(),
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn get_statistics(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let statistics = AdminService::new(state.store.clone()).statistics().await?;

    Ok(Json(json!({
        "success": true,
        "statistics": statistics
    })))
}
