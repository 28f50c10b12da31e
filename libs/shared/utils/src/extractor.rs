use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequest, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

use shared_models::error::AppError;
use shared_models::{AuthUser, Role};

use crate::jwt::validate_token;
use crate::state::AppState;

/// JSON request body. Malformed or mistyped bodies are rejected through
/// [`AppError`], so they get the usual `{success, message}` envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    auth_value
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))
}

/// Resolves the bearer token to a stored user and attaches it as
/// [`AuthUser`]. Tokens of deleted users stop working.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // Extract token from header
    let token = bearer_token(request.headers())?;

    // Validate token
    let claims = validate_token(token, &state.config.jwt_secret).map_err(AppError::Auth)?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Auth("Invalid token subject".to_string()))?;

    // Deleted accounts lose access immediately
    let user = state
        .store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::Auth("User no longer exists".to_string()))?;

    debug!("Authenticated {} as {}", user.id, user.role);
    // Add user to request extensions
    request.extensions_mut().insert(user.identity());

    Ok(next.run(request).await)
}

pub async fn require_patient(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    authorize(Role::Patient, request, next).await
}

pub async fn require_doctor(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    authorize(Role::Doctor, request, next).await
}

pub async fn require_admin(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    authorize(Role::Admin, request, next).await
}

async fn authorize(role: Role, request: Request<Body>, next: Next) -> Result<Response, AppError> {
    let user = extract_user(&request)?;
    if user.role != role {
        return Err(AppError::Forbidden(format!(
            "User role {} is not authorized to access this route",
            user.role
        )));
    }
    Ok(next.run(request).await)
}

pub fn extract_user<B>(request: &Request<B>) -> Result<AuthUser, AppError> {
    request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| AppError::Auth("User not found in request extensions".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_requires_prefix() {
        let mut headers = HeaderMap::new();
        assert_matches!(bearer_token(&headers), Err(AppError::Auth(msg)) if msg == "Missing authorization header");

        headers.insert("Authorization", HeaderValue::from_static("Token abc"));
        assert!(bearer_token(&headers).is_err());

        headers.insert("Authorization", HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_err());

        headers.insert("Authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    fn json_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn json_body_rejections_are_validation_errors() {
        let JsonBody(value) = JsonBody::<serde_json::Value>::from_request(json_request(r#"{"a":1}"#), &())
            .await
            .unwrap();
        assert_eq!(value["a"], 1);

        let broken = JsonBody::<serde_json::Value>::from_request(json_request("{"), &()).await;
        assert_matches!(broken, Err(AppError::ValidationError(msg)) if msg.starts_with("Invalid request body"));

        let untyped = Request::builder().method("POST").body(Body::from("{}")).unwrap();
        let missing = JsonBody::<serde_json::Value>::from_request(untyped, &()).await;
        assert_matches!(missing, Err(AppError::ValidationError(_)));
    }
}
