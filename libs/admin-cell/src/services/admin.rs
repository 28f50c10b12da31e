use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use shared_database::{AppointmentFilter, Store};
use shared_models::{AuthUser, Role, User};

use crate::models::{AdminError, AppointmentCounts, DoctorCounts, PlatformStatistics, UserCounts};

pub struct AdminService {
    store: Arc<dyn Store>,
}

impl AdminService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AdminError> {
        Ok(self.store.list_users().await?)
    }

    /// Delete a user and, for doctors, their profile.
    ///
    /// The profile goes first. If the user record then fails to delete, the
    /// profile is put back and the request fails.
    pub async fn delete_user(&self, admin: &AuthUser, user_id: Uuid) -> Result<(), AdminError> {
        debug!("Admin {} deleting user {}", admin.id, user_id);

        let user = self.store.find_user(user_id).await?.ok_or(AdminError::UserNotFound)?;

        if user.id == admin.id {
            warn!("Admin {} attempted to delete their own account", admin.id);
            return Err(AdminError::SelfDeletion);
        }

        let removed_profile = match user.role {
            Role::Doctor => self.store.delete_doctor_by_user(user.id).await?,
            _ => None,
        };

        match self.store.delete_user(user.id).await {
            Ok(true) => {}
            Ok(false) => warn!("User {} was already gone", user.id),
            Err(e) => {
                error!("Failed to delete user {}: {}", user.id, e);
                if let Some(profile) = removed_profile {
                    let profile_id = profile.id;
                    match self.store.insert_doctor(profile).await {
                        Ok(_) => info!("Restored doctor profile {} after failed user delete", profile_id),
                        Err(restore) => error!("Could not restore doctor profile {}: {}", profile_id, restore),
                    }
                }
                return Err(AdminError::DeletionFailed(e));
            }
        }

        info!("User {} ({}) deleted by admin {}", user.id, user.role, admin.id);
        Ok(())
    }

    pub async fn statistics(&self) -> Result<PlatformStatistics, AdminError> {
        let users = self.store.list_users().await?;
        let doctors = self.store.list_doctors(None).await?;
        let appointments = self.store.list_appointments(&AppointmentFilter::default()).await?;

        Ok(PlatformStatistics {
            users: UserCounts::tally(&users),
            doctors: DoctorCounts::tally(&doctors),
            appointments: AppointmentCounts::tally(&appointments),
        })
    }
}
