use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::Store;
use shared_models::{AuthUser, Doctor, DoctorStatus, DoctorView, UserSummary};

use crate::models::{DoctorError, DoctorProfileRequest, NumericInput};

pub struct DoctorService {
    store: Arc<dyn Store>,
}

impl DoctorService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create the profile for a doctor-role user. New profiles await admin
    /// approval.
    pub async fn create_profile(&self, user: &AuthUser, request: DoctorProfileRequest) -> Result<Doctor, DoctorError> {
        debug!("Creating doctor profile for user {}", user.id);

        if self.store.find_doctor_by_user(user.id).await?.is_some() {
            warn!("Doctor profile already exists for user {}", user.id);
            return Err(DoctorError::ProfileExists);
        }

        let specialization = required_text(request.specialization.as_deref(), "Please provide specialization")?;
        let qualifications = required_text(request.qualifications.as_deref(), "Please provide qualifications")?;
        let experience = experience_years(request.experience.as_ref())?
            .ok_or_else(|| DoctorError::ValidationError("Please provide years of experience".to_string()))?;
        let fees = fees_amount(request.fees.as_ref())?
            .ok_or_else(|| DoctorError::ValidationError("Please provide consultation fees".to_string()))?;
        let availability = match &request.availability {
            Some(input) => input.normalize()?,
            None => Vec::new(),
        };

        let doctor = Doctor {
            id: Uuid::new_v4(),
            user_id: user.id,
            specialization,
            qualifications,
            experience,
            fees,
            availability,
            about: request.about.map(|about| about.trim().to_string()).filter(|about| !about.is_empty()),
            image: request.image.map(|image| image.trim().to_string()).unwrap_or_default(),
            status: DoctorStatus::Pending,
            created_at: Utc::now(),
        };

        let doctor = self.store.insert_doctor(doctor).await?;
        info!("Doctor profile {} created for user {}, awaiting approval", doctor.id, user.id);
        Ok(doctor)
    }

    /// Update profile fields. Status is left alone; only admins change it.
    pub async fn update_profile(&self, user: &AuthUser, request: DoctorProfileRequest) -> Result<Doctor, DoctorError> {
        debug!("Updating doctor profile for user {}", user.id);

        let mut doctor = self
            .store
            .find_doctor_by_user(user.id)
            .await?
            .ok_or(DoctorError::ProfileRequired)?;

        if let Some(specialization) = request.specialization.as_deref() {
            doctor.specialization = required_text(Some(specialization), "Please provide specialization")?;
        }
        if let Some(qualifications) = request.qualifications.as_deref() {
            doctor.qualifications = required_text(Some(qualifications), "Please provide qualifications")?;
        }
        if let Some(experience) = experience_years(request.experience.as_ref())? {
            doctor.experience = experience;
        }
        if let Some(fees) = fees_amount(request.fees.as_ref())? {
            doctor.fees = fees;
        }
        if let Some(input) = &request.availability {
            doctor.availability = input.normalize()?;
        }
        if let Some(about) = request.about {
            let about = about.trim().to_string();
            doctor.about = if about.is_empty() { None } else { Some(about) };
        }
        if let Some(image) = request.image {
            doctor.image = image.trim().to_string();
        }

        let doctor = self.store.update_doctor(doctor).await?;
        info!("Doctor profile {} updated", doctor.id);
        Ok(doctor)
    }

    pub async fn get_profile(&self, user: &AuthUser) -> Result<DoctorView, DoctorError> {
        let doctor = self
            .store
            .find_doctor_by_user(user.id)
            .await?
            .ok_or(DoctorError::ProfileNotFound)?;
        self.with_user(doctor).await
    }

    /// The caller's own profile record, for scoping appointment queries.
    pub async fn own_profile(&self, user: &AuthUser) -> Result<Doctor, DoctorError> {
        self.store
            .find_doctor_by_user(user.id)
            .await?
            .ok_or(DoctorError::ProfileNotFound)
    }

    pub async fn get_doctor(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        self.store.find_doctor(doctor_id).await?.ok_or(DoctorError::NotFound)
    }

    /// Doctors with their user summaries, optionally filtered by status.
    pub async fn list_doctors(&self, status: Option<DoctorStatus>) -> Result<Vec<DoctorView>, DoctorError> {
        debug!("Listing doctors with status {:?}", status);
        let doctors = self.store.list_doctors(status).await?;

        let mut views = Vec::with_capacity(doctors.len());
        for doctor in doctors {
            views.push(self.with_user(doctor).await?);
        }
        Ok(views)
    }

    /// Admin decision on a profile.
    pub async fn set_status(&self, doctor_id: Uuid, status: DoctorStatus) -> Result<Doctor, DoctorError> {
        let doctor = self
            .store
            .set_doctor_status(doctor_id, status)
            .await?
            .ok_or(DoctorError::NotFound)?;
        info!("Doctor {} is now {}", doctor.id, doctor.status);
        Ok(doctor)
    }

    pub async fn with_user(&self, doctor: Doctor) -> Result<DoctorView, DoctorError> {
        let user = self.store.find_user(doctor.user_id).await?.as_ref().map(UserSummary::from);
        Ok(DoctorView { doctor, user })
    }
}

fn required_text(value: Option<&str>, message: &str) -> Result<String, DoctorError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| DoctorError::ValidationError(message.to_string()))
}

/// `Ok(None)` when the field is absent or blank.
fn experience_years(input: Option<&NumericInput>) -> Result<Option<i32>, DoctorError> {
    let Some(input) = input.filter(|input| !input.is_blank()) else {
        return Ok(None);
    };
    let years = input
        .value()
        .ok_or_else(|| DoctorError::ValidationError("Experience must be a number".to_string()))?;
    if years < 0.0 {
        return Err(DoctorError::ValidationError("Experience cannot be negative".to_string()));
    }
    if years.fract() != 0.0 || years > f64::from(i32::MAX) {
        return Err(DoctorError::ValidationError(
            "Experience must be a whole number of years".to_string(),
        ));
    }
    Ok(Some(years as i32))
}

fn fees_amount(input: Option<&NumericInput>) -> Result<Option<f64>, DoctorError> {
    let Some(input) = input.filter(|input| !input.is_blank()) else {
        return Ok(None);
    };
    let fees = input
        .value()
        .ok_or_else(|| DoctorError::ValidationError("Fees must be a number".to_string()))?;
    if fees < 0.0 {
        return Err(DoctorError::ValidationError("Fees cannot be negative".to_string()));
    }
    Ok(Some(fees))
}
