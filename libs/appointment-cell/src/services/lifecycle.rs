// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use shared_models::{AppointmentStatus, Role};

use crate::models::AppointmentError;

/// A status change someone can request on an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentAction {
    Accept,
    Reject,
    Cancel,
    Complete,
}

impl AppointmentAction {
    pub fn verb(&self) -> &'static str {
        match self {
            AppointmentAction::Accept => "accept",
            AppointmentAction::Reject => "reject",
            AppointmentAction::Cancel => "cancel",
            AppointmentAction::Complete => "complete",
        }
    }

    pub fn target(&self) -> AppointmentStatus {
        match self {
            AppointmentAction::Accept => AppointmentStatus::Approved,
            AppointmentAction::Reject => AppointmentStatus::Rejected,
            AppointmentAction::Cancel => AppointmentStatus::Cancelled,
            AppointmentAction::Complete => AppointmentStatus::Completed,
        }
    }

    /// Who may request it: the owning doctor, or the owning patient for cancel.
    pub fn actor(&self) -> Role {
        match self {
            AppointmentAction::Cancel => Role::Patient,
            _ => Role::Doctor,
        }
    }
}

pub struct AppointmentLifecycleService;

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: &AppointmentStatus,
        new_status: &AppointmentStatus,
    ) -> bool {
        debug!("Validating status transition from {} to {}", current_status, new_status);
        self.get_valid_transitions(current_status).contains(new_status)
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![
                AppointmentStatus::Approved,
                AppointmentStatus::Rejected,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Approved => vec![AppointmentStatus::Cancelled, AppointmentStatus::Completed],
            // Terminal states - no transitions allowed
            AppointmentStatus::Rejected => vec![],
            AppointmentStatus::Cancelled => vec![],
            AppointmentStatus::Completed => vec![],
        }
    }

    /// Statuses from which `action` may be applied.
    pub fn allowed_sources(&self, action: AppointmentAction) -> Vec<AppointmentStatus> {
        let target = action.target();
        AppointmentStatus::ALL
            .iter()
            .copied()
            .filter(|status| self.validate_status_transition(status, &target))
            .collect()
    }

    pub fn check_action(
        &self,
        action: AppointmentAction,
        current_status: AppointmentStatus,
    ) -> Result<AppointmentStatus, AppointmentError> {
        let target = action.target();
        if !self.validate_status_transition(&current_status, &target) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, target);
            return Err(AppointmentError::InvalidStatusTransition {
                action: action.verb(),
                current: current_status,
            });
        }
        Ok(target)
    }
}
