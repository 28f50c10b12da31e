use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Local;
use serde_json::{json, Value};

use appointment_cell::models::parse_id;
use appointment_cell::{AppointmentAction, AppointmentBookingService, BookAppointmentRequest};
use doctor_cell::{AvailabilityService, DoctorService};
use shared_database::AppointmentFilter;
use shared_models::error::AppError;
use shared_models::time::{format_time, parse_date};
use shared_models::{AuthUser, DoctorStatus, UserProfile};
use shared_utils::extractor::JsonBody;
use shared_utils::AppState;

use crate::models::{BookedSlotsQuery, UpdateProfileRequest};
use crate::services::PatientService;

// ==============================================================================
// DOCTOR DISCOVERY
// ==============================================================================

#[axum::debug_handler]
pub async fn get_doctors(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let doctors = DoctorService::new(state.store.clone())
        .list_doctors(Some(DoctorStatus::Approved))
        .await?;

    Ok(Json(json!({
        "success": true,
        "count": doctors.len(),
        "doctors": doctors
    })))
}

/// Times already held on a day, so clients can grey them out.
#[axum::debug_handler]
pub async fn get_booked_slots(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
    Query(query): Query<BookedSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = parse_id(&doctor_id)?;
    let raw_date = query
        .date
        .ok_or_else(|| AppError::ValidationError("Please provide a date".to_string()))?;
    let date = parse_date(&raw_date)
        .ok_or_else(|| AppError::ValidationError(format!("Invalid date: {}", raw_date)))?;

    let times = AppointmentBookingService::new(state.store.clone())
        .booked_times(doctor_id, date)
        .await?;
    let booked: Vec<String> = times.iter().map(format_time).collect();

    Ok(Json(json!({
        "success": true,
        "date": date,
        "count": booked.len(),
        "booked_slots": booked
    })))
}

/// Open slots for the next two weeks.
#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = parse_id(&doctor_id)?;
    let days = AvailabilityService::new(state.store.clone())
        .get_available_slots(doctor_id, Local::now().naive_local())
        .await?;

    Ok(Json(json!({
        "success": true,
        "doctor_id": doctor_id,
        "days": days
    })))
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    JsonBody(request): JsonBody<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment = AppointmentBookingService::new(state.store.clone())
        .book_appointment(&user, request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Appointment booked successfully",
            "appointment": appointment
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_my_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let appointments = AppointmentBookingService::new(state.store.clone())
        .list_appointments(&AppointmentFilter::for_patient(user.id))
        .await?;

    Ok(Json(json!({
        "success": true,
        "count": appointments.len(),
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointment_id = parse_id(&appointment_id)?;
    let appointment = AppointmentBookingService::new(state.store.clone())
        .apply_action(appointment_id, AppointmentAction::Cancel, &user)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment cancelled successfully",
        "appointment": appointment
    })))
}

// ==============================================================================
// PROFILE
// ==============================================================================

#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let stored = PatientService::new(state.store.clone()).get_profile(&user).await?;

    Ok(Json(json!({
        "success": true,
        "user": UserProfile::from(&stored)
    })))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    JsonBody(request): JsonBody<UpdateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let updated = PatientService::new(state.store.clone())
        .update_profile(&user, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully",
        "user": UserProfile::from(&updated)
    })))
}
