// libs/appointment-cell/src/services/booking.rs
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{AppointmentFilter, Store};
use shared_models::time::{parse_date, parse_time};
use shared_models::{Appointment, AppointmentStatus, AuthUser, Doctor, DoctorView, Role, UserSummary};

use crate::models::{parse_id, AppointmentError, AppointmentView, BookAppointmentRequest};
use crate::services::lifecycle::{AppointmentAction, AppointmentLifecycleService};

pub struct AppointmentBookingService {
    store: Arc<dyn Store>,
    lifecycle_service: AppointmentLifecycleService,
}

impl AppointmentBookingService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            lifecycle_service: AppointmentLifecycleService::new(),
        }
    }

    /// Book a pending appointment with an approved doctor.
    ///
    /// The requested time is not checked against existing bookings.
    pub async fn book_appointment(
        &self,
        patient: &AuthUser,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let doctor_id = required(request.doctor_id.as_deref(), "Please provide a doctor")?;
        let date = required(request.date.as_deref(), "Please provide appointment date")?;
        let time = required(request.time.as_deref(), "Please provide appointment time")?;
        let reason = required(request.reason.as_deref(), "Please provide reason for consultation")?;

        let doctor_id = parse_id(doctor_id)?;
        let date = parse_date(date)
            .ok_or_else(|| AppointmentError::ValidationError(format!("Invalid appointment date: {}", date)))?;
        let time = parse_time(time)
            .ok_or_else(|| AppointmentError::ValidationError(format!("Invalid appointment time: {}", time)))?;

        info!("Booking appointment for patient {} with doctor {} on {} {}", patient.id, doctor_id, date, time);

        let doctor = self
            .store
            .find_doctor(doctor_id)
            .await?
            .ok_or(AppointmentError::DoctorNotFound)?;

        if !doctor.is_bookable() {
            warn!("Doctor {} is {} and cannot take bookings", doctor.id, doctor.status);
            return Err(AppointmentError::DoctorNotAvailable);
        }

        let appointment = Appointment::new(patient.id, doctor.id, date, time, reason);
        let appointment = self.store.insert_appointment(appointment).await?;

        info!("Appointment {} booked with doctor {}", appointment.id, doctor.id);
        Ok(appointment)
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.store
            .find_appointment(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    /// Newest first.
    pub async fn list_appointments(&self, filter: &AppointmentFilter) -> Result<Vec<AppointmentView>, AppointmentError> {
        debug!("Listing appointments: {:?}", filter);
        let appointments = self.store.list_appointments(filter).await?;
        self.populate(appointments).await
    }

    /// Times already taken on `date`, ascending.
    pub async fn booked_times(&self, doctor_id: Uuid, date: NaiveDate) -> Result<Vec<NaiveTime>, AppointmentError> {
        let filter = AppointmentFilter::for_doctor(doctor_id)
            .on(date)
            .with_statuses(&AppointmentStatus::SLOT_HOLDING);

        let times: BTreeSet<NaiveTime> = self
            .store
            .list_appointments(&filter)
            .await?
            .into_iter()
            .map(|appointment| appointment.time)
            .collect();

        Ok(times.into_iter().collect())
    }

    /// Taken times per day over an inclusive date range.
    pub async fn booked_between(
        &self,
        doctor_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<HashMap<NaiveDate, BTreeSet<NaiveTime>>, AppointmentError> {
        let filter = AppointmentFilter::for_doctor(doctor_id)
            .between(from, to)
            .with_statuses(&AppointmentStatus::SLOT_HOLDING);

        let mut booked: HashMap<NaiveDate, BTreeSet<NaiveTime>> = HashMap::new();
        for appointment in self.store.list_appointments(&filter).await? {
            booked.entry(appointment.date).or_default().insert(appointment.time);
        }
        Ok(booked)
    }

    /// Apply `action` on behalf of `actor`.
    ///
    /// Ownership is checked before status. The write is conditional on the
    /// status still being one the action may leave, so a concurrent change
    /// surfaces as an invalid transition carrying the fresh status.
    pub async fn apply_action(
        &self,
        appointment_id: Uuid,
        action: AppointmentAction,
        actor: &AuthUser,
    ) -> Result<Appointment, AppointmentError> {
        debug!("{} requested on appointment {} by {}", action.verb(), appointment_id, actor.id);

        // Doctors act through their profile, which has its own id.
        let acting_doctor = match action.actor() {
            Role::Doctor => Some(
                self.store
                    .find_doctor_by_user(actor.id)
                    .await?
                    .ok_or(AppointmentError::DoctorProfileNotFound)?,
            ),
            _ => None,
        };

        let appointment = self.get_appointment(appointment_id).await?;

        match &acting_doctor {
            Some(doctor) if appointment.doctor_id != doctor.id => {
                warn!("Doctor {} tried to {} appointment {}", doctor.id, action.verb(), appointment.id);
                return Err(AppointmentError::Unauthorized(
                    "Not authorized to modify this appointment".to_string(),
                ));
            }
            None if appointment.patient_id != actor.id => {
                warn!("Patient {} tried to {} appointment {}", actor.id, action.verb(), appointment.id);
                return Err(AppointmentError::Unauthorized(format!(
                    "Not authorized to {} this appointment",
                    action.verb()
                )));
            }
            _ => {}
        }

        let target = self.lifecycle_service.check_action(action, appointment.status)?;
        let sources = self.lifecycle_service.allowed_sources(action);

        match self.store.transition_appointment(appointment.id, &sources, target).await? {
            Some(updated) => {
                info!("Appointment {} {} -> {}", updated.id, appointment.status, updated.status);
                Ok(updated)
            }
            None => {
                let current = self.get_appointment(appointment.id).await?.status;
                warn!("Appointment {} changed to {} before it could be updated", appointment.id, current);
                Err(AppointmentError::InvalidStatusTransition {
                    action: action.verb(),
                    current,
                })
            }
        }
    }

    /// Fill in patient and doctor summaries, fetching each referenced record once.
    pub async fn populate(&self, appointments: Vec<Appointment>) -> Result<Vec<AppointmentView>, AppointmentError> {
        let mut users: HashMap<Uuid, Option<UserSummary>> = HashMap::new();
        let mut doctors: HashMap<Uuid, Option<DoctorView>> = HashMap::new();

        let mut views = Vec::with_capacity(appointments.len());
        for appointment in appointments {
            if !users.contains_key(&appointment.patient_id) {
                let summary = self.user_summary(appointment.patient_id).await?;
                users.insert(appointment.patient_id, summary);
            }
            if !doctors.contains_key(&appointment.doctor_id) {
                let view = match self.store.find_doctor(appointment.doctor_id).await? {
                    Some(doctor) => Some(self.doctor_view(doctor).await?),
                    None => None,
                };
                doctors.insert(appointment.doctor_id, view);
            }

            views.push(AppointmentView {
                patient: users.get(&appointment.patient_id).cloned().flatten(),
                doctor: doctors.get(&appointment.doctor_id).cloned().flatten(),
                appointment,
            });
        }
        Ok(views)
    }

    async fn user_summary(&self, user_id: Uuid) -> Result<Option<UserSummary>, AppointmentError> {
        Ok(self.store.find_user(user_id).await?.as_ref().map(UserSummary::from))
    }

    async fn doctor_view(&self, doctor: Doctor) -> Result<DoctorView, AppointmentError> {
        let user = self.user_summary(doctor.user_id).await?;
        Ok(DoctorView { doctor, user })
    }
}

fn required<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str, AppointmentError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppointmentError::ValidationError(message.to_string()))
}
