//! JWT issuance and decoding

use axum::http::{header::AUTHORIZATION, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{error, warn};

use super::models::{Claims, Role, TokenKind};
use crate::common::{safe_token_log, ApiError, AppConfig};

/// User id carried by tokens of the admin account that lives in configuration
pub const HARDCODED_ADMIN_ID: &str = "admin";

const EMAIL_VERIFICATION_TTL_HOURS: i64 = 24;
const PASSWORD_RESET_TTL_MINUTES: i64 = 60;

/// Secondary header some admin clients send the token in
const ADMIN_AUTHORIZATION: &str = "admin-authorization";

pub fn build_claims(
    user_id: &str,
    email: &str,
    role: Option<Role>,
    kind: TokenKind,
    ttl: Duration,
) -> Claims {
    let now = Utc::now();
    Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role: role.map(|r| r.as_str().to_string()),
        is_admin: None,
        user_type: None,
        token_type: kind,
        iat: now.timestamp() as usize,
        exp: (now + ttl).timestamp() as usize,
        fingerprint: None,
    }
}

pub fn encode_claims(claims: &Claims, secret: &str) -> Result<String, ApiError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        error!(error = %e, user_id = %claims.sub, "JWT encoding error");
        ApiError::InternalServer("jwt error".to_string())
    })
}

/// Verifies signature and expiry, and that the token was minted for `kind`
pub fn decode_claims(token: &str, secret: &str, kind: TokenKind) -> Result<Claims, ApiError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| {
        warn!(error = %e, token = %safe_token_log(token), "JWT token validation failed");
        ApiError::Unauthorized("invalid token".to_string())
    })?;

    if decoded.claims.token_type != kind {
        warn!(
            expected = ?kind,
            actual = ?decoded.claims.token_type,
            "JWT token used for the wrong purpose"
        );
        return Err(ApiError::Unauthorized("invalid token".to_string()));
    }

    Ok(decoded.claims)
}

/// Access and refresh tokens for a successful login
pub fn issue_login_tokens(
    config: &AppConfig,
    user_id: &str,
    email: &str,
    role: Role,
) -> Result<(String, String), ApiError> {
    let access = build_claims(
        user_id,
        email,
        Some(role),
        TokenKind::Access,
        Duration::hours(config.access_token_ttl_hours),
    );
    let refresh = build_claims(
        user_id,
        email,
        Some(role),
        TokenKind::Refresh,
        Duration::days(config.refresh_token_ttl_days),
    );

    Ok((
        encode_claims(&access, &config.jwt_secret)?,
        encode_claims(&refresh, &config.jwt_secret)?,
    ))
}

/// New access token for the identity in a refresh token
pub fn refresh_access_token(config: &AppConfig, refresh: &Claims) -> Result<String, ApiError> {
    let access = build_claims(
        &refresh.sub,
        &refresh.email,
        Some(refresh.role()),
        TokenKind::Access,
        Duration::hours(config.access_token_ttl_hours),
    );
    encode_claims(&access, &config.jwt_secret)
}

pub fn issue_email_verification_token(
    config: &AppConfig,
    user_id: &str,
    email: &str,
) -> Result<String, ApiError> {
    let claims = build_claims(
        user_id,
        email,
        None,
        TokenKind::EmailVerification,
        Duration::hours(EMAIL_VERIFICATION_TTL_HOURS),
    );
    encode_claims(&claims, &config.jwt_secret)
}

pub fn issue_password_reset_token(
    config: &AppConfig,
    user_id: &str,
    email: &str,
    password_hash: Option<&str>,
) -> Result<String, ApiError> {
    let mut claims = build_claims(
        user_id,
        email,
        None,
        TokenKind::PasswordReset,
        Duration::minutes(PASSWORD_RESET_TTL_MINUTES),
    );
    claims.fingerprint = Some(password_fingerprint(password_hash));
    encode_claims(&claims, &config.jwt_secret)
}

/// Tail of the stored hash. It changes whenever the password does, which
/// invalidates reset tokens issued before the change.
pub fn password_fingerprint(password_hash: Option<&str>) -> String {
    let hash = password_hash.unwrap_or("");
    let tail: String = hash.chars().rev().take(16).collect();
    tail.chars().rev().collect()
}

/// Bearer token from `Authorization`, falling back to `Admin-Authorization`.
/// A bare token without the `Bearer ` prefix is accepted as well.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    [AUTHORIZATION.as_str(), ADMIN_AUTHORIZATION]
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .map(|raw| raw.trim())
        .map(|raw| raw.strip_prefix("Bearer ").unwrap_or(raw).trim())
        .find(|token| !token.is_empty())
        .map(str::to_string)
}
