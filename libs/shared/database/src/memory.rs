use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_models::{Appointment, AppointmentStatus, Doctor, DoctorStatus, User};

use crate::store::{AppointmentFilter, Store, StoreError, StoreResult};

/// Process-local store. Each collection sits behind its own lock, so a
/// single write is atomic but nothing spans collections.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    doctors: RwLock<HashMap<Uuid, Doctor>>,
    appointments: RwLock<HashMap<Uuid, Appointment>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_user(&self, user: User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(StoreError::Conflict(format!("email {} already registered", user.email)));
        }
        users.insert(user.id, user.clone());
        debug!("Inserted user {}", user.id);
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by_key(|user| user.created_at);
        Ok(users)
    }

    async fn update_user(&self, user: User) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|existing| existing.id != user.id && existing.email == user.email)
        {
            return Err(StoreError::Conflict(format!("email {} already registered", user.email)));
        }
        match users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(user)
            }
            None => Err(StoreError::NotFound(format!("user {}", user.id))),
        }
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }

    async fn insert_doctor(&self, doctor: Doctor) -> StoreResult<Doctor> {
        let mut doctors = self.doctors.write().await;
        if doctors.values().any(|existing| existing.user_id == doctor.user_id) {
            return Err(StoreError::Conflict(format!(
                "doctor profile for user {} already exists",
                doctor.user_id
            )));
        }
        doctors.insert(doctor.id, doctor.clone());
        debug!("Inserted doctor profile {}", doctor.id);
        Ok(doctor)
    }

    async fn find_doctor(&self, id: Uuid) -> StoreResult<Option<Doctor>> {
        Ok(self.doctors.read().await.get(&id).cloned())
    }

    async fn find_doctor_by_user(&self, user_id: Uuid) -> StoreResult<Option<Doctor>> {
        Ok(self
            .doctors
            .read()
            .await
            .values()
            .find(|doctor| doctor.user_id == user_id)
            .cloned())
    }

    async fn list_doctors(&self, status: Option<DoctorStatus>) -> StoreResult<Vec<Doctor>> {
        let mut doctors: Vec<Doctor> = self
            .doctors
            .read()
            .await
            .values()
            .filter(|doctor| status.map_or(true, |status| doctor.status == status))
            .cloned()
            .collect();
        doctors.sort_by_key(|doctor| doctor.created_at);
        Ok(doctors)
    }

    async fn update_doctor(&self, doctor: Doctor) -> StoreResult<Doctor> {
        let mut doctors = self.doctors.write().await;
        match doctors.get_mut(&doctor.id) {
            Some(slot) => {
                *slot = doctor.clone();
                Ok(doctor)
            }
            None => Err(StoreError::NotFound(format!("doctor {}", doctor.id))),
        }
    }

    async fn set_doctor_status(&self, id: Uuid, status: DoctorStatus) -> StoreResult<Option<Doctor>> {
        let mut doctors = self.doctors.write().await;
        Ok(doctors.get_mut(&id).map(|doctor| {
            doctor.status = status;
            doctor.clone()
        }))
    }

    async fn delete_doctor_by_user(&self, user_id: Uuid) -> StoreResult<Option<Doctor>> {
        let mut doctors = self.doctors.write().await;
        let id = doctors
            .values()
            .find(|doctor| doctor.user_id == user_id)
            .map(|doctor| doctor.id);
        Ok(id.and_then(|id| doctors.remove(&id)))
    }

    async fn insert_appointment(&self, appointment: Appointment) -> StoreResult<Appointment> {
        self.appointments
            .write()
            .await
            .insert(appointment.id, appointment.clone());
        debug!("Inserted appointment {}", appointment.id);
        Ok(appointment)
    }

    async fn find_appointment(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        Ok(self.appointments.read().await.get(&id).cloned())
    }

    async fn list_appointments(&self, filter: &AppointmentFilter) -> StoreResult<Vec<Appointment>> {
        let mut appointments: Vec<Appointment> = self
            .appointments
            .read()
            .await
            .values()
            .filter(|appointment| filter.matches(appointment))
            .cloned()
            .collect();
        appointments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(appointments)
    }

    async fn transition_appointment(
        &self,
        id: Uuid,
        from: &[AppointmentStatus],
        to: AppointmentStatus,
    ) -> StoreResult<Option<Appointment>> {
        let mut appointments = self.appointments.write().await;
        Ok(appointments
            .get_mut(&id)
            .filter(|appointment| from.contains(&appointment.status))
            .map(|appointment| {
                appointment.status = to;
                appointment.clone()
            }))
    }
}
