use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::UserProfile;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A freshly issued session token and the user it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    ValidationError(String),

    #[error("User already exists with this email")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Token issue failed: {0}")]
    Token(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::ValidationError(msg) => AppError::ValidationError(msg),
            AuthError::EmailTaken => AppError::Conflict(err.to_string()),
            AuthError::InvalidCredentials | AuthError::UserNotFound => AppError::Auth(err.to_string()),
            AuthError::Hashing(_) | AuthError::Token(_) => AppError::Internal(err.to_string()),
            AuthError::Store(StoreError::Conflict(_)) => AppError::Conflict(AuthError::EmailTaken.to_string()),
            AuthError::Store(inner) => inner.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failures_are_unauthorized() {
        let err = AppError::from(AuthError::InvalidCredentials);
        assert_eq!(err.status_code().as_u16(), 401);
        assert_eq!(err.message(), "Invalid email or password");
    }

    #[test]
    fn store_conflicts_read_as_taken_emails() {
        let err = AppError::from(AuthError::Store(StoreError::Conflict("users.email".into())));
        assert_eq!(err.status_code().as_u16(), 409);
        assert_eq!(err.message(), "User already exists with this email");
    }

    #[test]
    fn signup_role_is_optional() {
        let req: SignupRequest =
            serde_json::from_value(serde_json::json!({"name": "Ada", "email": "a@b.io", "password": "secret1"})).unwrap();
        assert!(req.role.is_none());
    }
}
