use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Memory,
    Supabase,
}

impl FromStr for DatabaseBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(DatabaseBackend::Memory),
            "supabase" | "postgrest" => Ok(DatabaseBackend::Supabase),
            other => Err(format!("unknown database backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_backend: DatabaseBackend,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub jwt_secret: String,
    pub jwt_expires_hours: i64,
    pub frontend_url: String,
    pub admin_name: String,
    pub admin_email: String,
    pub admin_password: String,
    pub http_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            database_backend: DatabaseBackend::Memory,
            supabase_url: String::new(),
            supabase_service_key: String::new(),
            jwt_secret: String::new(),
            jwt_expires_hours: 168,
            frontend_url: String::new(),
            admin_name: "Administrator".to_string(),
            admin_email: String::new(),
            admin_password: String::new(),
            http_timeout_secs: 10,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            port: parse_var("PORT", defaults.port),
            database_backend: parse_var("DATABASE_BACKEND", defaults.database_backend),
            supabase_url: env::var("SUPABASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_KEY not set, using empty value");
                    String::new()
                }),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            jwt_expires_hours: parse_var("JWT_EXPIRES_HOURS", defaults.jwt_expires_hours),
            frontend_url: env::var("FRONTEND_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_default(),
            admin_name: env::var("ADMIN_NAME").unwrap_or(defaults.admin_name),
            admin_email: env::var("ADMIN_EMAIL").unwrap_or_default(),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or_default(),
            http_timeout_secs: parse_var("HTTP_TIMEOUT_SECS", defaults.http_timeout_secs),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        if self.jwt_secret.is_empty() {
            return false;
        }
        match self.database_backend {
            DatabaseBackend::Memory => true,
            DatabaseBackend::Supabase => self.is_supabase_configured(),
        }
    }

    pub fn is_supabase_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_service_key.is_empty()
    }

    /// Admin seeding only happens when both credentials are present.
    pub fn admin_seed(&self) -> Option<(&str, &str, &str)> {
        if self.admin_email.is_empty() || self.admin_password.is_empty() {
            return None;
        }
        Some((&self.admin_name, &self.admin_email, &self.admin_password))
    }

    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins = vec!["http://localhost:3000".to_string()];
        if !self.frontend_url.is_empty() {
            origins.push(self.frontend_url.clone());
        }
        origins
    }
}

fn parse_var<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {:?}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
