use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use appointment_cell::{AppointmentAction, AppointmentBookingService, AppointmentError, BookAppointmentRequest};
use shared_database::{AppointmentFilter, MemoryStore, Store, StoreResult};
use shared_models::{Appointment, AppointmentStatus, Doctor, DoctorStatus, User};
use shared_utils::test_utils::{TestConfig, TestFixtures, TestUser};

/// Memory store where another writer cancels the appointment just before
/// every status transition lands.
struct CancelledFirst {
    inner: MemoryStore,
}

#[async_trait]
impl Store for CancelledFirst {
    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }

    async fn insert_user(&self, user: User) -> StoreResult<User> {
        self.inner.insert_user(user).await
    }
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.inner.find_user(id).await
    }
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.inner.find_user_by_email(email).await
    }
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        self.inner.list_users().await
    }
    async fn update_user(&self, user: User) -> StoreResult<User> {
        self.inner.update_user(user).await
    }
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_user(id).await
    }

    async fn insert_doctor(&self, doctor: Doctor) -> StoreResult<Doctor> {
        self.inner.insert_doctor(doctor).await
    }
    async fn find_doctor(&self, id: Uuid) -> StoreResult<Option<Doctor>> {
        self.inner.find_doctor(id).await
    }
    async fn find_doctor_by_user(&self, user_id: Uuid) -> StoreResult<Option<Doctor>> {
        self.inner.find_doctor_by_user(user_id).await
    }
    async fn list_doctors(&self, status: Option<DoctorStatus>) -> StoreResult<Vec<Doctor>> {
        self.inner.list_doctors(status).await
    }
    async fn update_doctor(&self, doctor: Doctor) -> StoreResult<Doctor> {
        self.inner.update_doctor(doctor).await
    }
    async fn set_doctor_status(&self, id: Uuid, status: DoctorStatus) -> StoreResult<Option<Doctor>> {
        self.inner.set_doctor_status(id, status).await
    }
    async fn delete_doctor_by_user(&self, user_id: Uuid) -> StoreResult<Option<Doctor>> {
        self.inner.delete_doctor_by_user(user_id).await
    }

    async fn insert_appointment(&self, appointment: Appointment) -> StoreResult<Appointment> {
        self.inner.insert_appointment(appointment).await
    }
    async fn find_appointment(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        self.inner.find_appointment(id).await
    }
    async fn list_appointments(&self, filter: &AppointmentFilter) -> StoreResult<Vec<Appointment>> {
        self.inner.list_appointments(filter).await
    }
    async fn transition_appointment(
        &self,
        id: Uuid,
        from: &[AppointmentStatus],
        to: AppointmentStatus,
    ) -> StoreResult<Option<Appointment>> {
        self.inner
            .transition_appointment(id, &[AppointmentStatus::Pending], AppointmentStatus::Cancelled)
            .await?;
        self.inner.transition_appointment(id, from, to).await
    }
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, day).unwrap()
}

fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

fn request(doctor_id: Uuid) -> BookAppointmentRequest {
    BookAppointmentRequest {
        doctor_id: Some(doctor_id.to_string()),
        date: Some("2026-06-01".to_string()),
        time: Some("10:30".to_string()),
        reason: Some("  Persistent cough ".to_string()),
    }
}

#[tokio::test]
async fn books_pending_appointment_with_approved_doctor() {
    let state = TestConfig::default().to_state();
    let (_, patient) = TestFixtures::user(&state, TestUser::patient("pat@example.com")).await;
    let (_, doctor) = TestFixtures::doctor(&state, "doc@example.com", DoctorStatus::Approved, vec![]).await;

    let service = AppointmentBookingService::new(state.store.clone());
    let appointment = service.book_appointment(&patient, request(doctor.id)).await.unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Pending);
    assert_eq!(appointment.patient_id, patient.id);
    assert_eq!(appointment.doctor_id, doctor.id);
    assert_eq!(appointment.date, date(1));
    assert_eq!(appointment.time, time(10, 30));
    assert_eq!(appointment.reason, "Persistent cough");
}

#[tokio::test]
async fn refuses_doctors_that_are_not_approved() {
    let state = TestConfig::default().to_state();
    let (_, patient) = TestFixtures::user(&state, TestUser::patient("pat@example.com")).await;
    let (_, pending) = TestFixtures::doctor(&state, "pending@example.com", DoctorStatus::Pending, vec![]).await;
    let (_, blocked) = TestFixtures::doctor(&state, "blocked@example.com", DoctorStatus::Blocked, vec![]).await;

    let service = AppointmentBookingService::new(state.store.clone());
    assert_matches!(
        service.book_appointment(&patient, request(pending.id)).await,
        Err(AppointmentError::DoctorNotAvailable)
    );
    assert_matches!(
        service.book_appointment(&patient, request(blocked.id)).await,
        Err(AppointmentError::DoctorNotAvailable)
    );
    assert_matches!(
        service.book_appointment(&patient, request(Uuid::new_v4())).await,
        Err(AppointmentError::DoctorNotFound)
    );
}

#[tokio::test]
async fn validates_booking_fields() {
    let state = TestConfig::default().to_state();
    let (_, patient) = TestFixtures::user(&state, TestUser::patient("pat@example.com")).await;
    let (_, doctor) = TestFixtures::doctor(&state, "doc@example.com", DoctorStatus::Approved, vec![]).await;
    let service = AppointmentBookingService::new(state.store.clone());

    let missing_reason = BookAppointmentRequest { reason: Some("   ".to_string()), ..request(doctor.id) };
    assert_matches!(
        service.book_appointment(&patient, missing_reason).await,
        Err(AppointmentError::ValidationError(msg)) if msg == "Please provide reason for consultation"
    );

    let bad_time = BookAppointmentRequest { time: Some("half past ten".to_string()), ..request(doctor.id) };
    assert_matches!(service.book_appointment(&patient, bad_time).await, Err(AppointmentError::ValidationError(_)));

    let bad_id = BookAppointmentRequest { doctor_id: Some("not-a-uuid".to_string()), ..request(doctor.id) };
    assert_matches!(service.book_appointment(&patient, bad_id).await, Err(AppointmentError::ValidationError(_)));
}

#[tokio::test]
async fn doctor_accepts_only_own_pending_appointments() {
    let state = TestConfig::default().to_state();
    let (_, patient) = TestFixtures::user(&state, TestUser::patient("pat@example.com")).await;
    let (doctor_user, doctor) = TestFixtures::doctor(&state, "doc@example.com", DoctorStatus::Approved, vec![]).await;
    let (other_user, _) = TestFixtures::doctor(&state, "other@example.com", DoctorStatus::Approved, vec![]).await;

    let appointment =
        TestFixtures::appointment(&state, patient.id, doctor.id, date(2), time(9, 0), AppointmentStatus::Pending).await;
    let service = AppointmentBookingService::new(state.store.clone());

    assert_matches!(
        service.apply_action(appointment.id, AppointmentAction::Accept, &other_user).await,
        Err(AppointmentError::Unauthorized(msg)) if msg == "Not authorized to modify this appointment"
    );

    let accepted = service
        .apply_action(appointment.id, AppointmentAction::Accept, &doctor_user)
        .await
        .unwrap();
    assert_eq!(accepted.status, AppointmentStatus::Approved);

    assert_matches!(
        service.apply_action(appointment.id, AppointmentAction::Reject, &doctor_user).await,
        Err(AppointmentError::InvalidStatusTransition { action: "reject", current: AppointmentStatus::Approved })
    );
}

#[tokio::test]
async fn ownership_is_checked_before_status() {
    let state = TestConfig::default().to_state();
    let (_, patient) = TestFixtures::user(&state, TestUser::patient("pat@example.com")).await;
    let (_, stranger) = TestFixtures::user(&state, TestUser::patient("stranger@example.com")).await;
    let (_, doctor) = TestFixtures::doctor(&state, "doc@example.com", DoctorStatus::Approved, vec![]).await;

    let appointment =
        TestFixtures::appointment(&state, patient.id, doctor.id, date(2), time(9, 0), AppointmentStatus::Cancelled)
            .await;
    let service = AppointmentBookingService::new(state.store.clone());

    assert_matches!(
        service.apply_action(appointment.id, AppointmentAction::Cancel, &stranger).await,
        Err(AppointmentError::Unauthorized(msg)) if msg == "Not authorized to cancel this appointment"
    );
    assert_matches!(
        service.apply_action(appointment.id, AppointmentAction::Cancel, &patient).await,
        Err(AppointmentError::InvalidStatusTransition { current: AppointmentStatus::Cancelled, .. })
    );
}

#[tokio::test]
async fn patient_cancels_pending_and_approved() {
    let state = TestConfig::default().to_state();
    let (_, patient) = TestFixtures::user(&state, TestUser::patient("pat@example.com")).await;
    let (_, doctor) = TestFixtures::doctor(&state, "doc@example.com", DoctorStatus::Approved, vec![]).await;
    let service = AppointmentBookingService::new(state.store.clone());

    for status in [AppointmentStatus::Pending, AppointmentStatus::Approved] {
        let appointment = TestFixtures::appointment(&state, patient.id, doctor.id, date(3), time(11, 0), status).await;
        let cancelled = service
            .apply_action(appointment.id, AppointmentAction::Cancel, &patient)
            .await
            .unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
    }

    for (hour, status) in [(12, AppointmentStatus::Completed), (13, AppointmentStatus::Rejected)] {
        let closed = TestFixtures::appointment(&state, patient.id, doctor.id, date(3), time(hour, 0), status).await;
        assert_matches!(
            service.apply_action(closed.id, AppointmentAction::Cancel, &patient).await,
            Err(AppointmentError::InvalidStatusTransition { action: "cancel", current }) if current == status
        );
        let stored = state.store.find_appointment(closed.id).await.unwrap().unwrap();
        assert_eq!(stored.status, status);
    }
}

#[tokio::test]
async fn doctor_without_profile_cannot_act() {
    let state = TestConfig::default().to_state();
    let (_, doctor_user) = TestFixtures::user(&state, TestUser::doctor("new@example.com")).await;
    let service = AppointmentBookingService::new(state.store.clone());

    assert_matches!(
        service.apply_action(Uuid::new_v4(), AppointmentAction::Accept, &doctor_user).await,
        Err(AppointmentError::DoctorProfileNotFound)
    );
}

#[tokio::test]
async fn booked_times_only_count_live_appointments() {
    let state = TestConfig::default().to_state();
    let (_, patient) = TestFixtures::user(&state, TestUser::patient("pat@example.com")).await;
    let (_, doctor) = TestFixtures::doctor(&state, "doc@example.com", DoctorStatus::Approved, vec![]).await;

    TestFixtures::appointment(&state, patient.id, doctor.id, date(4), time(11, 0), AppointmentStatus::Approved).await;
    TestFixtures::appointment(&state, patient.id, doctor.id, date(4), time(9, 30), AppointmentStatus::Pending).await;
    TestFixtures::appointment(&state, patient.id, doctor.id, date(4), time(9, 30), AppointmentStatus::Pending).await;
    TestFixtures::appointment(&state, patient.id, doctor.id, date(4), time(10, 0), AppointmentStatus::Cancelled).await;
    TestFixtures::appointment(&state, patient.id, doctor.id, date(5), time(10, 0), AppointmentStatus::Pending).await;

    let service = AppointmentBookingService::new(state.store.clone());
    assert_eq!(service.booked_times(doctor.id, date(4)).await.unwrap(), vec![time(9, 30), time(11, 0)]);

    let week = service.booked_between(doctor.id, date(4), date(10)).await.unwrap();
    assert_eq!(week.len(), 2);
    assert!(week[&date(5)].contains(&time(10, 0)));
}

#[tokio::test]
async fn listings_embed_patient_and_doctor() {
    let state = TestConfig::default().to_state();
    let (_, patient) = TestFixtures::user(&state, TestUser::patient("pat@example.com")).await;
    let (_, doctor) = TestFixtures::doctor(&state, "doc@example.com", DoctorStatus::Approved, vec![]).await;
    TestFixtures::appointment(&state, patient.id, doctor.id, date(6), time(14, 0), AppointmentStatus::Pending).await;

    let service = AppointmentBookingService::new(state.store.clone());
    let views = service
        .list_appointments(&AppointmentFilter::for_patient(patient.id))
        .await
        .unwrap();

    assert_eq!(views.len(), 1);
    let view = &views[0];
    assert_eq!(view.patient.as_ref().unwrap().email, "pat@example.com");
    let doctor_view = view.doctor.as_ref().unwrap();
    assert_eq!(doctor_view.doctor.id, doctor.id);
    assert_eq!(doctor_view.user.as_ref().unwrap().email, "doc@example.com");

    let json = serde_json::to_value(view).unwrap();
    assert_eq!(json["time"], "14:00");
    assert_eq!(json["doctor"]["user"]["name"], "Test Doctor");
}

#[tokio::test]
async fn concurrent_change_reports_the_fresh_status() {
    let state = TestConfig::default().to_state_with(Arc::new(CancelledFirst { inner: MemoryStore::new() }));
    let (_, patient) = TestFixtures::user(&state, TestUser::patient("pat@example.com")).await;
    let (doctor_user, doctor) = TestFixtures::doctor(&state, "doc@example.com", DoctorStatus::Approved, vec![]).await;
    let appointment =
        TestFixtures::appointment(&state, patient.id, doctor.id, date(4), time(9, 0), AppointmentStatus::Pending).await;

    let service = AppointmentBookingService::new(state.store.clone());
    let result = service.apply_action(appointment.id, AppointmentAction::Accept, &doctor_user).await;

    assert_matches!(
        result,
        Err(AppointmentError::InvalidStatusTransition { action: "accept", current: AppointmentStatus::Cancelled })
    );
    let stored = state.store.find_appointment(appointment.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AppointmentStatus::Cancelled);
}
