use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use appointment_cell::AppointmentError;
use shared_database::StoreError;
use shared_models::doctor::AvailabilityError;
use shared_models::error::AppError;
use shared_models::time::format_time;
use shared_models::{AvailabilityInput, DayOfWeek};

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// A number that may arrive as a JSON number or a numeric string, as HTML
/// form inputs send it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
}

impl NumericInput {
    /// `None` for blank or non-numeric text.
    pub fn value(&self) -> Option<f64> {
        match self {
            NumericInput::Number(n) => Some(*n).filter(|n| n.is_finite()),
            NumericInput::Text(raw) => raw.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, NumericInput::Text(raw) if raw.trim().is_empty())
    }
}

/// Body of both profile create and update. On update, absent fields keep
/// their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorProfileRequest {
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub qualifications: Option<String>,
    #[serde(default)]
    pub experience: Option<NumericInput>,
    #[serde(default)]
    pub fees: Option<NumericInput>,
    #[serde(default)]
    pub availability: Option<AvailabilityInput>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

/// Open slots on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySlots {
    pub date: NaiveDate,
    pub day: DayOfWeek,
    #[serde(serialize_with = "serialize_times")]
    pub slots: Vec<NaiveTime>,
}

fn serialize_times<S>(times: &[NaiveTime], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(times.iter().map(format_time))
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Doctor profile not found")]
    ProfileNotFound,

    #[error("Doctor profile not found. Please create a profile first.")]
    ProfileRequired,

    #[error("Doctor profile already exists. Use update endpoint instead.")]
    ProfileExists,

    #[error("Doctor is not available for appointments")]
    NotBookable,

    #[error("{0}")]
    ValidationError(String),

    #[error(transparent)]
    InvalidAvailability(#[from] AvailabilityError),

    #[error(transparent)]
    Appointment(#[from] AppointmentError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound | DoctorError::ProfileNotFound | DoctorError::ProfileRequired => {
                AppError::NotFound(err.to_string())
            }
            DoctorError::ProfileExists | DoctorError::NotBookable => AppError::BadRequest(err.to_string()),
            DoctorError::ValidationError(msg) => AppError::ValidationError(msg),
            DoctorError::InvalidAvailability(inner) => AppError::ValidationError(inner.to_string()),
            DoctorError::Appointment(inner) => inner.into(),
            DoctorError::Store(inner) => inner.into(),
        }
    }
}
