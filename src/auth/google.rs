//! Google ID token verification against the tokeninfo endpoint
//!
//! Docs: https://developers.google.com/identity/sign-in/web/backend-auth

use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::common::{safe_email_log, ApiError};

#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("invalid or malformed Google credential")]
    InvalidCredential,

    #[error("expired or invalid Google credential")]
    Rejected,

    #[error("Email not found in Google token")]
    MissingEmail,

    #[error("token audience mismatch")]
    AudienceMismatch,

    #[error("token has expired")]
    Expired,

    #[error("google token validation service unavailable")]
    Unavailable,
}

impl From<GoogleError> for ApiError {
    fn from(err: GoogleError) -> Self {
        match err {
            GoogleError::InvalidCredential | GoogleError::MissingEmail => {
                ApiError::BadRequest(err.to_string())
            }
            GoogleError::Rejected | GoogleError::AudienceMismatch | GoogleError::Expired => {
                ApiError::Unauthorized(err.to_string())
            }
            GoogleError::Unavailable => ApiError::InternalServer(err.to_string()),
        }
    }
}

/// Identity asserted by a verified Google ID token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleIdentity {
    pub email: String,
    pub subject: Option<String>,
    pub email_verified: bool,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
}

/// Calls tokeninfo and validates the returned payload
pub async fn verify_id_token(
    http: &Client,
    tokeninfo_url: &str,
    credential: &str,
    client_id: Option<&str>,
) -> Result<GoogleIdentity, GoogleError> {
    let url = format!(
        "{}?id_token={}",
        tokeninfo_url,
        urlencoding::encode(credential)
    );

    debug!("Initiating Google token validation with tokeninfo endpoint");

    let response = http.get(&url).send().await.map_err(|e| {
        error!(
            error = %e,
            endpoint = %tokeninfo_url,
            "HTTP error contacting Google tokeninfo endpoint"
        );
        GoogleError::Unavailable
    })?;

    let status = response.status();
    if !status.is_success() {
        warn!(http_status = %status, "Google tokeninfo rejected credential");
        return Err(match status.as_u16() {
            401 => GoogleError::Rejected,
            _ => GoogleError::InvalidCredential,
        });
    }

    let body: Value = response.json().await.map_err(|e| {
        error!(error = %e, "Failed to parse Google tokeninfo JSON response");
        GoogleError::InvalidCredential
    })?;

    validate_tokeninfo(&body, client_id, Utc::now().timestamp())
}

/// Checks a tokeninfo payload: email present, not expired, and issued for
/// our client when a client id is configured.
pub fn validate_tokeninfo(
    body: &Value,
    client_id: Option<&str>,
    now: i64,
) -> Result<GoogleIdentity, GoogleError> {
    let text = |key: &str| body.get(key).and_then(|v| v.as_str()).map(str::to_string);

    let email = text("email")
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .ok_or(GoogleError::MissingEmail)?;

    // tokeninfo returns numbers and booleans as strings
    let exp = body.get("exp").and_then(|v| {
        v.as_i64()
            .or_else(|| v.as_str().and_then(|s| s.parse::<i64>().ok()))
    });
    if let Some(exp) = exp {
        if exp < now {
            warn!(token_exp = exp, current_time = now, "Google token has expired");
            return Err(GoogleError::Expired);
        }
    }

    if let Some(expected) = client_id {
        match text("aud") {
            Some(aud) if aud == expected => {}
            other => {
                warn!(
                    token_audience = ?other,
                    expected_client_id = %expected,
                    "Google token audience validation failed - rejecting token"
                );
                return Err(GoogleError::AudienceMismatch);
            }
        }
    }

    let email_verified = match body.get("email_verified") {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    };

    debug!(
        email = %safe_email_log(&email),
        email_verified = email_verified,
        "Google token validation successful"
    );

    Ok(GoogleIdentity {
        email,
        subject: text("sub"),
        email_verified,
        given_name: text("given_name"),
        family_name: text("family_name"),
    })
}
