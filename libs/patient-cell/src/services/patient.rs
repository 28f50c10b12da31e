use std::sync::Arc;

use tracing::{debug, info, warn};

use shared_database::{Store, StoreError};
use shared_models::user::normalize_email;
use shared_models::{AuthUser, User};
use shared_utils::password::is_valid_email;

use crate::models::{PatientError, UpdateProfileRequest};

pub struct PatientService {
    store: Arc<dyn Store>,
}

impl PatientService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn get_profile(&self, user: &AuthUser) -> Result<User, PatientError> {
        self.store.find_user(user.id).await?.ok_or(PatientError::NotFound)
    }

    /// Change name and/or email. Absent fields are kept.
    pub async fn update_profile(&self, user: &AuthUser, request: UpdateProfileRequest) -> Result<User, PatientError> {
        debug!("Updating profile for user {}", user.id);
        let mut stored = self.get_profile(user).await?;

        if let Some(name) = request.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(PatientError::ValidationError("Please provide a name".to_string()));
            }
            stored.name = name.to_string();
        }

        if let Some(email) = request.email {
            if !is_valid_email(&email) {
                return Err(PatientError::ValidationError("Please provide a valid email".to_string()));
            }
            let email = normalize_email(&email);
            if email != stored.email {
                if let Some(existing) = self.store.find_user_by_email(&email).await? {
                    warn!("User {} tried to take email already used by {}", user.id, existing.id);
                    return Err(PatientError::EmailTaken);
                }
                stored.email = email;
            }
        }

        let updated = self.store.update_user(stored).await.map_err(|e| match e {
            StoreError::Conflict(_) => PatientError::EmailTaken,
            other => PatientError::Store(other),
        })?;
        info!("Profile updated for user {}", updated.id);
        Ok(updated)
    }
}
