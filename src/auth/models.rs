//! Authentication data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::subscriptions::models::SubscriptionSummary;

/// The two roles a principal can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn from_admin_flag(is_admin: bool) -> Self {
        if is_admin {
            Role::Admin
        } else {
            Role::User
        }
    }
}

/// What a signed token may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    #[default]
    Access,
    Refresh,
    EmailVerification,
    PasswordReset,
}

/// JWT claims structure
///
/// `is_admin` and `user_type` are only read, never written: tokens minted
/// by older clients carried the admin flag under those names.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    #[serde(default)]
    pub token_type: TokenKind,
    #[serde(default)]
    pub iat: usize,
    pub exp: usize,
    /// Binds password reset tokens to the password they were issued for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl Claims {
    /// The one place the admin claim is interpreted
    pub fn role(&self) -> Role {
        let admin = self.role.as_deref() == Some("admin")
            || self.is_admin == Some(true)
            || self.user_type.as_deref() == Some("admin");
        Role::from_admin_flag(admin)
    }
}

/// User database model
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub role: String,
    pub is_staff: bool,
    pub email_verified: bool,
    pub google_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub password2: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleAuthRequest {
    pub credential: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailOnlyRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirmRequest {
    pub password: String,
    pub password2: String,
}

/// Token pair returned by every login path
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub is_staff: bool,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user: User,
    pub message: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct GoogleAuthResponse {
    #[serde(flatten)]
    pub tokens: LoginResponse,
    pub is_new_user: bool,
}

/// The caller's own account as shown on the profile page
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub is_staff: bool,
    pub email_verified: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_joined: Option<String>,
    pub subscription: SubscriptionSummary,
}
