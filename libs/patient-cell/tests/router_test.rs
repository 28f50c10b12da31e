use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

use patient_cell::patient_routes;
use shared_models::DoctorStatus;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestFixtures, TestUser};

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn patient_books_over_http() {
    let config = TestConfig::default();
    let state = config.to_state();
    let (patient, _) = TestFixtures::user(&state, TestUser::patient("pat@example.com")).await;
    let (_, doctor) = TestFixtures::doctor(&state, "doc@example.com", DoctorStatus::Approved, vec![]).await;
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, None);

    let request = Request::builder()
        .method("POST")
        .uri("/appointments")
        .header("Authorization", format!("Bearer {}", token))
        .header("Content-Type", "application/json")
        .body(Body::from(
            json!({
                "doctorId": doctor.id,
                "date": "2026-09-14",
                "time": "09:00",
                "reason": "Annual physical"
            })
            .to_string(),
        ))
        .unwrap();

    let response = patient_routes(state.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["appointment"]["doctor_id"], doctor.id.to_string());
}

#[tokio::test]
async fn doctors_cannot_use_patient_routes() {
    let config = TestConfig::default();
    let state = config.to_state();
    let (doctor, _) = TestFixtures::user(&state, TestUser::doctor("doc@example.com")).await;
    let token = JwtTestUtils::create_test_token(&doctor, &config.jwt_secret, None);

    let response = patient_routes(state)
        .oneshot(
            Request::builder()
                .uri("/doctors")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn expired_tokens_are_rejected() {
    let config = TestConfig::default();
    let state = config.to_state();
    let (patient, _) = TestFixtures::user(&state, TestUser::patient("pat@example.com")).await;
    let token = JwtTestUtils::create_expired_token(&patient, &config.jwt_secret);

    let response = patient_routes(state)
        .oneshot(
            Request::builder()
                .uri("/profile")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(response).await["message"], "Token expired");
}

#[tokio::test]
async fn malformed_bodies_use_the_error_envelope() {
    let config = TestConfig::default();
    let state = config.to_state();
    let (patient, _) = TestFixtures::user(&state, TestUser::patient("pat@example.com")).await;
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, None);

    let bodies = [
        json!({ "doctorId": 42, "date": "2026-09-14", "time": "09:00", "reason": "Checkup" }).to_string(),
        "not json".to_string(),
    ];

    for body in bodies {
        let request = Request::builder()
            .method("POST")
            .uri("/appointments")
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/json")
            .body(Body::from(body))
            .unwrap();

        let response = patient_routes(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = read_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().starts_with("Invalid request body"));
    }
}
