use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use shared_config::AppConfig;
use shared_database::Store;
use shared_models::user::normalize_email;
use shared_models::{AuthUser, Role, User, UserProfile};
use shared_utils::jwt::issue_token;
use shared_utils::password::{hash_password, is_valid_email, verify_password, MIN_PASSWORD_LENGTH};

use crate::models::{AuthError, LoginRequest, Session, SignupRequest};

pub struct AuthService {
    store: Arc<dyn Store>,
    config: Arc<AppConfig>,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    /// Register a patient or doctor and open a session for them.
    #[instrument(skip(self, request), fields(email = ?request.email))]
    pub async fn signup(&self, request: SignupRequest) -> Result<Session, AuthError> {
        let name = required(request.name, "Please provide your name")?;
        let email = required(request.email, "Please provide an email")?;
        let password = request
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AuthError::ValidationError("Please provide a password".to_string()))?;

        if !is_valid_email(&email) {
            return Err(AuthError::ValidationError("Please provide a valid email".to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::ValidationError(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        let role = signup_role(request.role.as_deref())?;

        if self.store.find_user_by_email(&normalize_email(&email)).await?.is_some() {
            warn!("Signup rejected, email already registered");
            return Err(AuthError::EmailTaken);
        }

        let hash = hash_password(&password).map_err(|e| AuthError::Hashing(e.to_string()))?;
        let user = self.store.insert_user(User::new(&name, &email, hash, role)).await?;

        info!("User {} signed up as {}", user.id, user.role);
        self.open_session(&user)
    }

    #[instrument(skip(self, request), fields(email = ?request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<Session, AuthError> {
        let (Some(email), Some(password)) = (request.email, request.password) else {
            return Err(AuthError::ValidationError("Please provide email and password".to_string()));
        };

        let user = self
            .store
            .find_user_by_email(&normalize_email(&email))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let matches = verify_password(&password, &user.password_hash).unwrap_or_else(|e| {
            warn!("Stored hash for user {} is unusable: {}", user.id, e);
            false
        });
        if !matches {
            debug!("Password mismatch for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        info!("User {} logged in", user.id);
        self.open_session(&user)
    }

    pub async fn current_user(&self, identity: &AuthUser) -> Result<User, AuthError> {
        self.store.find_user(identity.id).await?.ok_or(AuthError::UserNotFound)
    }

    fn open_session(&self, user: &User) -> Result<Session, AuthError> {
        let token = issue_token(user, &self.config.jwt_secret, self.config.jwt_expires_hours).map_err(AuthError::Token)?;
        Ok(Session {
            token,
            user: UserProfile::from(user),
        })
    }
}

fn required(value: Option<String>, message: &str) -> Result<String, AuthError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AuthError::ValidationError(message.to_string()))
}

/// Admins are never self-registered.
fn signup_role(raw: Option<&str>) -> Result<Role, AuthError> {
    match raw.map(str::trim) {
        None | Some("") | Some("patient") => Ok(Role::Patient),
        Some("doctor") => Ok(Role::Doctor),
        Some(other) => Err(AuthError::ValidationError(format!(
            "Invalid role '{}'. Must be patient or doctor",
            other
        ))),
    }
}
