use serde::Serialize;
use thiserror::Error;

use appointment_cell::AppointmentError;
use doctor_cell::DoctorError;
use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::{Appointment, AppointmentStatus, Doctor, DoctorStatus, Role, User};

// ==============================================================================
// STATISTICS
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserCounts {
    pub total: usize,
    pub patients: usize,
    pub doctors: usize,
    pub admins: usize,
}

impl UserCounts {
    pub fn tally(users: &[User]) -> Self {
        let mut counts = Self { total: users.len(), ..Self::default() };
        for user in users {
            match user.role {
                Role::Patient => counts.patients += 1,
                Role::Doctor => counts.doctors += 1,
                Role::Admin => counts.admins += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DoctorCounts {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub blocked: usize,
}

impl DoctorCounts {
    pub fn tally(doctors: &[Doctor]) -> Self {
        let mut counts = Self { total: doctors.len(), ..Self::default() };
        for doctor in doctors {
            match doctor.status {
                DoctorStatus::Pending => counts.pending += 1,
                DoctorStatus::Approved => counts.approved += 1,
                DoctorStatus::Blocked => counts.blocked += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppointmentCounts {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub cancelled: usize,
    pub completed: usize,
}

impl AppointmentCounts {
    pub fn tally(appointments: &[Appointment]) -> Self {
        let mut counts = Self { total: appointments.len(), ..Self::default() };
        for appointment in appointments {
            match appointment.status {
                AppointmentStatus::Pending => counts.pending += 1,
                AppointmentStatus::Approved => counts.approved += 1,
                AppointmentStatus::Rejected => counts.rejected += 1,
                AppointmentStatus::Cancelled => counts.cancelled += 1,
                AppointmentStatus::Completed => counts.completed += 1,
            }
        }
        counts
    }
}

/// Counts per collection, each taken from a single listing so totals always
/// equal the sum of their parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlatformStatistics {
    pub users: UserCounts,
    pub doctors: DoctorCounts,
    pub appointments: AppointmentCounts,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("User not found")]
    UserNotFound,

    #[error("Cannot delete your own account")]
    SelfDeletion,

    #[error("Failed to delete user: {0}")]
    DeletionFailed(StoreError),

    #[error(transparent)]
    Doctor(#[from] DoctorError),

    #[error(transparent)]
    Appointment(#[from] AppointmentError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AdminError> for AppError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::UserNotFound => AppError::NotFound(err.to_string()),
            AdminError::SelfDeletion => AppError::BadRequest(err.to_string()),
            AdminError::DeletionFailed(_) => AppError::Internal(err.to_string()),
            AdminError::Doctor(inner) => inner.into(),
            AdminError::Appointment(inner) => inner.into(),
            AdminError::Store(inner) => inner.into(),
        }
    }
}
