use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use appointment_cell::models::parse_id;
use appointment_cell::{AppointmentAction, AppointmentBookingService};
use shared_database::AppointmentFilter;
use shared_models::error::AppError;
use shared_models::{AppointmentStatus, AuthUser};
use shared_utils::extractor::JsonBody;
use shared_utils::AppState;

use crate::models::DoctorProfileRequest;
use crate::services::doctor::DoctorService;

// ==============================================================================
// PROFILE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    JsonBody(request): JsonBody<DoctorProfileRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let doctor_service = DoctorService::new(state.store.clone());
    let doctor = doctor_service.create_profile(&user, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Doctor profile created successfully. Awaiting admin approval.",
            "doctor": doctor
        })),
    ))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    JsonBody(request): JsonBody<DoctorProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(state.store.clone());
    let doctor = doctor_service.update_profile(&user, request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully",
        "doctor": doctor
    })))
}

#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(state.store.clone());
    let doctor = doctor_service.get_profile(&user).await?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor
    })))
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    list_own_appointments(&state, &user, None).await
}

/// Consultations the doctor has taken on: approved and completed.
#[axum::debug_handler]
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    list_own_appointments(
        &state,
        &user,
        Some(&[AppointmentStatus::Approved, AppointmentStatus::Completed][..]),
    )
    .await
}

#[axum::debug_handler]
pub async fn accept_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointment_id = parse_id(&appointment_id)?;
    let booking_service = AppointmentBookingService::new(state.store.clone());
    let appointment = booking_service
        .apply_action(appointment_id, AppointmentAction::Accept, &user)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment accepted successfully",
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn reject_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointment_id = parse_id(&appointment_id)?;
    let booking_service = AppointmentBookingService::new(state.store.clone());
    let appointment = booking_service
        .apply_action(appointment_id, AppointmentAction::Reject, &user)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment rejected",
        "appointment": appointment
    })))
}

async fn list_own_appointments(
    state: &AppState,
    user: &AuthUser,
    statuses: Option<&[AppointmentStatus]>,
) -> Result<Json<Value>, AppError> {
    let doctor = DoctorService::new(state.store.clone()).own_profile(user).await?;

    let mut filter = AppointmentFilter::for_doctor(doctor.id);
    if let Some(statuses) = statuses {
        filter = filter.with_statuses(statuses);
    }

    let appointments = AppointmentBookingService::new(state.store.clone())
        .list_appointments(&filter)
        .await?;

    Ok(Json(json!({
        "success": true,
        "count": appointments.len(),
        "appointments": appointments
    })))
}
