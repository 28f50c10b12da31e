use std::sync::Arc;

use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
};
use axum_extra::typed_header::{TypedHeaderRejection, TypedHeaderRejectionReason};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tracing::debug;

use shared_models::auth::TokenResponse;
use shared_models::error::AppError;
use shared_models::{AuthUser, UserProfile};
use shared_utils::jwt::validate_token as decode_token;
use shared_utils::extractor::JsonBody;
use shared_utils::AppState;

use crate::models::{LoginRequest, SignupRequest};
use crate::services::auth::AuthService;

type BearerHeader = Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>;

fn bearer(header: BearerHeader) -> Result<String, AppError> {
    match header {
        Ok(TypedHeader(Authorization(bearer))) => Ok(bearer.token().to_string()),
        Err(rejection) => match rejection.reason() {
            TypedHeaderRejectionReason::Missing => Err(AppError::Auth("Missing authorization header".to_string())),
            _ => Err(AppError::Auth("Invalid authorization header format".to_string())),
        },
    }
}

#[axum::debug_handler]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<SignupRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let session = AuthService::new(state.store.clone(), state.config.clone())
        .signup(request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User registered successfully",
            "token": session.token,
            "user": session.user
        })),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let session = AuthService::new(state.store.clone(), state.config.clone())
        .login(request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "token": session.token,
        "user": session.user
    })))
}

#[axum::debug_handler]
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    debug!("Getting profile for user: {}", user.id);
    let user = AuthService::new(state.store.clone(), state.config.clone())
        .current_user(&user)
        .await?;

    Ok(Json(json!({
        "success": true,
        "user": UserProfile::from(&user)
    })))
}

#[axum::debug_handler]
pub async fn validate_token(
    State(state): State<Arc<AppState>>,
    header: BearerHeader,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");
    let token = bearer(header)?;

    let claims = decode_token(&token, &state.config.jwt_secret).map_err(AppError::Auth)?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: claims.sub,
        email: claims.email,
        role: claims.role,
    }))
}

#[axum::debug_handler]
pub async fn verify_token(
    State(state): State<Arc<AppState>>,
    header: BearerHeader,
) -> Result<Json<Value>, AppError> {
    debug!("Verifying token");
    let token = bearer(header)?;

    let valid = decode_token(&token, &state.config.jwt_secret).is_ok();
    Ok(Json(json!({ "valid": valid })))
}
