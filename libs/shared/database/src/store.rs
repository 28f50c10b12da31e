use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use shared_models::error::AppError;
use shared_models::{Appointment, AppointmentStatus, Doctor, DoctorStatus, User};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => AppError::NotFound(msg),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            other => AppError::Database(other.to_string()),
        }
    }
}

/// Query over the appointments collection. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentFilter {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub statuses: Option<Vec<AppointmentStatus>>,
}

impl AppointmentFilter {
    pub fn for_patient(patient_id: Uuid) -> Self {
        Self { patient_id: Some(patient_id), ..Default::default() }
    }

    pub fn for_doctor(doctor_id: Uuid) -> Self {
        Self { doctor_id: Some(doctor_id), ..Default::default() }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date_from = Some(date);
        self.date_to = Some(date);
        self
    }

    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }

    pub fn with_statuses(mut self, statuses: &[AppointmentStatus]) -> Self {
        self.statuses = Some(statuses.to_vec());
        self
    }

    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.patient_id.map_or(true, |id| appointment.patient_id == id)
            && self.doctor_id.map_or(true, |id| appointment.doctor_id == id)
            && self.date_from.map_or(true, |from| appointment.date >= from)
            && self.date_to.map_or(true, |to| appointment.date <= to)
            && self
                .statuses
                .as_ref()
                .map_or(true, |statuses| statuses.contains(&appointment.status))
    }
}

/// Persistence for the three MediConnect collections.
///
/// Every mutating call touches exactly one record. `transition_appointment`
/// is a conditional write: it only applies while the stored status is one of
/// `from`, and returns `None` otherwise.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;

    async fn insert_user(&self, user: User) -> StoreResult<User>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn update_user(&self, user: User) -> StoreResult<User>;
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;

    async fn insert_doctor(&self, doctor: Doctor) -> StoreResult<Doctor>;
    async fn find_doctor(&self, id: Uuid) -> StoreResult<Option<Doctor>>;
    async fn find_doctor_by_user(&self, user_id: Uuid) -> StoreResult<Option<Doctor>>;
    async fn list_doctors(&self, status: Option<DoctorStatus>) -> StoreResult<Vec<Doctor>>;
    async fn update_doctor(&self, doctor: Doctor) -> StoreResult<Doctor>;
    async fn set_doctor_status(&self, id: Uuid, status: DoctorStatus) -> StoreResult<Option<Doctor>>;
    async fn delete_doctor_by_user(&self, user_id: Uuid) -> StoreResult<Option<Doctor>>;

    async fn insert_appointment(&self, appointment: Appointment) -> StoreResult<Appointment>;
    async fn find_appointment(&self, id: Uuid) -> StoreResult<Option<Appointment>>;
    /// Newest first.
    async fn list_appointments(&self, filter: &AppointmentFilter) -> StoreResult<Vec<Appointment>>;
    async fn transition_appointment(
        &self,
        id: Uuid,
        from: &[AppointmentStatus],
        to: AppointmentStatus,
    ) -> StoreResult<Option<Appointment>>;
}
