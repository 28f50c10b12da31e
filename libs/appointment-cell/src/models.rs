use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::{Appointment, AppointmentStatus, DoctorView, UserSummary};

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Booking payload. Fields arrive as strings so that a missing or malformed
/// value is reported in the API's own error shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookAppointmentRequest {
    #[serde(default, alias = "doctorId")]
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

/// An appointment with its patient and doctor filled in. Either side is
/// `None` when the referenced record no longer exists.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient: Option<UserSummary>,
    pub doctor: Option<DoctorView>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Doctor profile not found")]
    DoctorProfileNotFound,

    #[error("Doctor is not available for appointments")]
    DoctorNotAvailable,

    #[error("{0}")]
    Unauthorized(String),

    #[error("Cannot {action} appointment with status: {current}")]
    InvalidStatusTransition {
        action: &'static str,
        current: AppointmentStatus,
    },

    #[error("{0}")]
    ValidationError(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppointmentError {
    pub fn invalid_id(raw: &str) -> Self {
        AppointmentError::ValidationError(format!("Invalid id: {}", raw))
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound
            | AppointmentError::DoctorNotFound
            | AppointmentError::DoctorProfileNotFound => AppError::NotFound(err.to_string()),
            AppointmentError::DoctorNotAvailable => AppError::BadRequest(err.to_string()),
            AppointmentError::Unauthorized(msg) => AppError::Forbidden(msg),
            AppointmentError::InvalidStatusTransition { current, .. } => AppError::InvalidTransition {
                message: err.to_string(),
                current_status: current.to_string(),
            },
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::Store(store) => store.into(),
        }
    }
}

/// Parses a path or body identifier.
pub fn parse_id(raw: &str) -> Result<Uuid, AppointmentError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppointmentError::invalid_id(raw))
}
