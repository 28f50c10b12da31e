use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

use auth_cell::auth_routes;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestFixtures, TestUser};

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn signup_then_me_over_http() {
    let state = TestConfig::default().to_state();

    let request = Request::builder()
        .method("POST")
        .uri("/signup")
        .header("Content-Type", "application/json")
        .body(Body::from(
            json!({
                "name": "Ada Lovelace",
                "email": "ada@example.com",
                "password": "analytical",
                "role": "patient"
            })
            .to_string(),
        ))
        .unwrap();

    let response = auth_routes(state.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    let token = body["token"].as_str().unwrap().to_string();

    let response = auth_routes(state)
        .oneshot(
            Request::builder()
                .uri("/me")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["user"]["email"], "ada@example.com");
}

#[tokio::test]
async fn validate_decodes_tokens() {
    let config = TestConfig::default();
    let state = config.to_state();
    let (user, _) = TestFixtures::user(&state, TestUser::doctor("doc@example.com")).await;
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);

    let response = auth_routes(state.clone()).oneshot(post("/validate", Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["user_id"], user.id.to_string());
    assert_eq!(body["role"], "doctor");

    let expired = JwtTestUtils::create_expired_token(&user, &config.jwt_secret);
    let response = auth_routes(state.clone()).oneshot(post("/validate", Some(&expired))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = auth_routes(state).oneshot(post("/validate", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(response).await["message"], "Missing authorization header");
}

#[tokio::test]
async fn verify_reports_validity_without_failing() {
    let config = TestConfig::default();
    let state = config.to_state();
    let (user, _) = TestFixtures::user(&state, TestUser::patient("pat@example.com")).await;

    let good = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);
    let response = auth_routes(state.clone()).oneshot(post("/verify", Some(&good))).await.unwrap();
    assert_eq!(read_json(response).await["valid"], true);

    let forged = JwtTestUtils::create_invalid_signature_token(&user);
    let response = auth_routes(state.clone()).oneshot(post("/verify", Some(&forged))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["valid"], false);

    let malformed = JwtTestUtils::create_malformed_token();
    let response = auth_routes(state).oneshot(post("/verify", Some(&malformed))).await.unwrap();
    assert_eq!(read_json(response).await["valid"], false);
}

#[tokio::test]
async fn deleted_users_lose_access_to_me() {
    let config = TestConfig::default();
    let state = config.to_state();
    let (user, _) = TestFixtures::user(&state, TestUser::patient("gone@example.com")).await;
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);
    state.store.delete_user(user.id).await.unwrap();

    let response = auth_routes(state)
        .oneshot(
            Request::builder()
                .uri("/me")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
