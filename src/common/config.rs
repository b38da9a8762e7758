// src/common/config.rs
//! Environment-driven application configuration

use std::collections::HashSet;
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown EMAIL_BACKEND '{0}' (expected smtp, console or memory)")]
    UnknownEmailBackend(String),
    #[error("EMAIL_BACKEND=smtp requires SMTP_HOST")]
    MissingSmtpHost,
    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}

/// The single admin account that exists only in configuration.
/// Logging in with these credentials never touches the users table.
#[derive(Debug, Clone)]
pub struct HardcodedAdmin {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailBackendKind {
    Smtp(SmtpSettings),
    Console,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub reset_db: bool,
    pub jwt_secret: String,
    pub access_token_ttl_hours: i64,
    pub refresh_token_ttl_days: i64,
    /// Notification recipient and, with a password, the hardcoded admin login
    pub admin_email: Option<String>,
    pub hardcoded_admin: Option<HardcodedAdmin>,
    pub admin_emails: HashSet<String>,
    pub google_client_id: Option<String>,
    pub google_tokeninfo_url: String,
    pub frontend_url: String,
    pub email_backend: EmailBackendKind,
    pub default_from_email: String,
    pub cors_origins: Vec<String>,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, which keeps tests
    /// away from process-wide environment mutation.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let admin_email = get("ADMIN_EMAIL").map(|e| e.trim().to_lowercase());
        let hardcoded_admin = match (&admin_email, get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(HardcodedAdmin {
                email: email.clone(),
                password,
            }),
            _ => None,
        };

        let mut admin_emails = parse_email_list(&get("ADMIN_EMAILS").unwrap_or_default());
        if let Some(email) = &admin_email {
            admin_emails.insert(email.clone());
        }

        let email_backend = match get("EMAIL_BACKEND")
            .unwrap_or_else(|| "console".to_string())
            .to_lowercase()
            .as_str()
        {
            "smtp" => EmailBackendKind::Smtp(SmtpSettings {
                host: get("SMTP_HOST").ok_or(ConfigError::MissingSmtpHost)?,
                port: parse_number("SMTP_PORT", get("SMTP_PORT"), 587)?,
                username: get("SMTP_USERNAME"),
                password: get("SMTP_PASSWORD"),
            }),
            "console" => EmailBackendKind::Console,
            "memory" => EmailBackendKind::Memory,
            other => return Err(ConfigError::UnknownEmailBackend(other.to_string())),
        };

        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| {
                "http://localhost:3000,http://localhost:5173".to_string()
            })
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            database_url: get("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://review_api.db".to_string()),
            reset_db: get("RESET_DB").map_or(false, |v| v.to_lowercase() == "true"),
            jwt_secret: get("JWT_SECRET")
                .unwrap_or_else(|| "replace_with_strong_secret".to_string()),
            access_token_ttl_hours: parse_number(
                "ACCESS_TOKEN_TTL_HOURS",
                get("ACCESS_TOKEN_TTL_HOURS"),
                24,
            )?,
            refresh_token_ttl_days: parse_number(
                "REFRESH_TOKEN_TTL_DAYS",
                get("REFRESH_TOKEN_TTL_DAYS"),
                7,
            )?,
            admin_email,
            hardcoded_admin,
            admin_emails,
            google_client_id: get("GOOGLE_CLIENT_ID"),
            google_tokeninfo_url: get("GOOGLE_TOKENINFO_URL")
                .unwrap_or_else(|| "https://oauth2.googleapis.com/tokeninfo".to_string()),
            frontend_url: get("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:5173".to_string())
                .trim_end_matches('/')
                .to_string(),
            email_backend,
            default_from_email: get("DEFAULT_FROM_EMAIL")
                .unwrap_or_else(|| "noreply@localhost".to_string()),
            cors_origins,
            port: parse_number("PORT", get("PORT"), 8080)?,
        })
    }
}

/// Parse a comma-separated list of emails into a lowercase set
pub fn parse_email_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_number<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match raw {
        None => Ok(default),
        Some(value) => match value.trim().parse::<T>() {
            Ok(n) if n > T::default() => Ok(n),
            _ => Err(ConfigError::InvalidNumber { name, value }),
        },
    }
}
