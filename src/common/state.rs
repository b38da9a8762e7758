// Application state shared across all modules

use reqwest::Client;
use sqlx::SqlitePool;
use std::sync::Arc;

use super::config::AppConfig;
use crate::services::EmailService;

/// Application state containing database pool, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub http: Client,
    pub config: Arc<AppConfig>,
    pub email_service: Arc<EmailService>,
}

impl AppState {
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt_secret
    }

    /// True when `email` belongs to the configured hardcoded admin login.
    /// That address can never be registered as a regular account.
    pub fn is_hardcoded_admin_email(&self, email: &str) -> bool {
        self.config
            .hardcoded_admin
            .as_ref()
            .is_some_and(|admin| admin.email.eq_ignore_ascii_case(email.trim()))
    }

    /// Case-insensitive membership in the configured admin email set
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.config.admin_emails.contains(&email.trim().to_lowercase())
    }
}
