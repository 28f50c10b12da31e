use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{MemoryStore, Store};
use shared_models::{Appointment, AppointmentStatus, AuthUser, AvailabilityWindow, Doctor, DoctorStatus, Role, User};

use crate::jwt::issue_token;
use crate::state::AppState;

pub const TEST_PASSWORD: &str = "password123";

pub struct TestConfig {
    pub jwt_secret: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            jwt_secret: self.jwt_secret.clone(),
            jwt_expires_hours: 24,
            ..AppConfig::default()
        }
    }

    /// State over a fresh in-memory store.
    pub fn to_state(&self) -> Arc<AppState> {
        self.to_state_with(Arc::new(MemoryStore::new()))
    }

    pub fn to_state_with(&self, store: Arc<dyn Store>) -> Arc<AppState> {
        Arc::new(AppState::new(self.to_app_config(), store))
    }
}

pub struct TestUser;

impl TestUser {
    /// Builds a user whose password is [`TEST_PASSWORD`]. Hashing is skipped
    /// unless `hashed` is set, since argon2 is slow in debug builds.
    pub fn new(name: &str, email: &str, role: Role, hashed: bool) -> User {
        let hash = if hashed {
            crate::password::hash_password(TEST_PASSWORD).unwrap_or_default()
        } else {
            "unhashed".to_string()
        };
        User::new(name, email, hash, role)
    }

    pub fn patient(email: &str) -> User {
        Self::new("Test Patient", email, Role::Patient, false)
    }

    pub fn doctor(email: &str) -> User {
        Self::new("Test Doctor", email, Role::Doctor, false)
    }

    pub fn admin(email: &str) -> User {
        Self::new("Test Admin", email, Role::Admin, false)
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &User, secret: &str, exp_hours: Option<i64>) -> String {
        issue_token(user, secret, exp_hours.unwrap_or(24)).unwrap_or_default()
    }

    pub fn create_expired_token(user: &User, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &User) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Seeds records straight into a store, bypassing handlers.
pub struct TestFixtures;

impl TestFixtures {
    pub async fn user(state: &AppState, user: User) -> (User, AuthUser) {
        let stored = state.store.insert_user(user).await.unwrap_or_else(|e| panic!("seed user: {}", e));
        let identity = stored.identity();
        (stored, identity)
    }

    pub async fn doctor(
        state: &AppState,
        email: &str,
        status: DoctorStatus,
        availability: Vec<AvailabilityWindow>,
    ) -> (AuthUser, Doctor) {
        let (user, identity) = Self::user(state, TestUser::doctor(email)).await;
        let doctor = Doctor {
            id: Uuid::new_v4(),
            user_id: user.id,
            specialization: "General Practice".to_string(),
            qualifications: "MBBS".to_string(),
            experience: 8,
            fees: 60.0,
            availability,
            about: Some("Family doctor".to_string()),
            image: String::new(),
            status,
            created_at: Utc::now(),
        };
        let doctor = state
            .store
            .insert_doctor(doctor)
            .await
            .unwrap_or_else(|e| panic!("seed doctor: {}", e));
        (identity, doctor)
    }

    pub async fn appointment(
        state: &AppState,
        patient_id: Uuid,
        doctor_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        status: AppointmentStatus,
    ) -> Appointment {
        let mut appointment = Appointment::new(patient_id, doctor_id, date, time, "Routine checkup");
        appointment.status = status;
        state
            .store
            .insert_appointment(appointment)
            .await
            .unwrap_or_else(|e| panic!("seed appointment: {}", e))
    }
}
