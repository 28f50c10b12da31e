use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::{AppConfig, DatabaseBackend};
use shared_database::{AppointmentFilter, Store, StoreError, SupabaseStore};
use shared_models::{Appointment, AppointmentStatus, Role, User};

fn store_for(server: &MockServer) -> SupabaseStore {
    let config = AppConfig {
        database_backend: DatabaseBackend::Supabase,
        supabase_url: server.uri(),
        supabase_service_key: "service-key".to_string(),
        ..AppConfig::default()
    };
    SupabaseStore::new(&config).unwrap()
}

fn appointment(status: AppointmentStatus) -> Appointment {
    let mut appointment = Appointment::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
        NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
        "Follow-up",
    );
    appointment.status = status;
    appointment
}

#[tokio::test]
async fn requests_carry_the_service_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(header("apikey", "service-key"))
        .and(header("Authorization", "Bearer service-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    store_for(&server).ping().await.unwrap();
}

#[tokio::test]
async fn find_user_by_email_returns_first_row() {
    let server = MockServer::start().await;
    let user = User::new("Ada", "ada@example.com", "hash".to_string(), Role::Patient);

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("email", "eq.ada@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([user])))
        .mount(&server)
        .await;

    let found = store_for(&server).find_user_by_email("ada@example.com").await.unwrap();
    assert_eq!(found, Some(user));
}

#[tokio::test]
async fn conflicts_map_to_store_conflicts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key value violates unique constraint"))
        .mount(&server)
        .await;

    let user = User::new("Ada", "ada@example.com", "hash".to_string(), Role::Patient);
    let result = store_for(&server).insert_user(user).await;
    assert_matches!(result, Err(StoreError::Conflict(_)));
}

#[tokio::test]
async fn server_errors_are_backend_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let result = store_for(&server).list_doctors(None).await;
    assert_matches!(result, Err(StoreError::Backend(msg)) if msg.contains("503"));
}

#[tokio::test]
async fn transition_is_conditional_on_current_status() {
    let server = MockServer::start().await;
    let stored = appointment(AppointmentStatus::Approved);

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", stored.id)))
        .and(query_param("status", "in.(pending)"))
        .and(body_json(json!({ "status": "approved" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([stored])))
        .expect(1)
        .mount(&server)
        .await;

    let updated = store_for(&server)
        .transition_appointment(stored.id, &[AppointmentStatus::Pending], AppointmentStatus::Approved)
        .await
        .unwrap();
    assert_eq!(updated.map(|a| a.status), Some(AppointmentStatus::Approved));
}

#[tokio::test]
async fn lost_transition_returns_none() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let updated = store_for(&server)
        .transition_appointment(Uuid::new_v4(), &[AppointmentStatus::Pending], AppointmentStatus::Rejected)
        .await
        .unwrap();
    assert!(updated.is_none());
}

#[tokio::test]
async fn appointment_listing_sends_filters() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param("status", "in.(pending,approved)"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([appointment(AppointmentStatus::Pending)])))
        .expect(1)
        .mount(&server)
        .await;

    let filter = AppointmentFilter::for_doctor(doctor_id)
        .with_statuses(&[AppointmentStatus::Pending, AppointmentStatus::Approved]);
    let rows = store_for(&server).list_appointments(&filter).await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn delete_user_reports_whether_a_row_was_removed() {
    let server = MockServer::start().await;
    let gone = Uuid::new_v4();

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", gone)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    assert!(!store_for(&server).delete_user(gone).await.unwrap());
}
