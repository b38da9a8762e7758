//! Authentication extractors for Axum
//!
//! `Principal` is the only role gate in the service: every protected
//! handler takes either a `Principal` or an `AdminPrincipal`.

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::request::Parts,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use super::models::{Role, TokenKind};
use super::tokens::{bearer_token, decode_claims, HARDCODED_ADMIN_ID};
use crate::common::{safe_email_log, ApiError, AppState};

/// Authenticated identity decoded from an access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// True for the admin account that has no users row
    pub fn is_hardcoded_admin(&self) -> bool {
        self.id == HARDCODED_ADMIN_ID
    }
}

/// A principal that passed the admin check
#[derive(Debug, Clone)]
pub struct AdminPrincipal(pub Principal);

impl std::ops::Deref for AdminPrincipal {
    type Target = Principal;

    fn deref(&self) -> &Principal {
        &self.0
    }
}

/// Resolves a bearer token into a principal.
///
/// Tokens for the configured admin are trusted without a database lookup;
/// every other token must still belong to an existing user.
pub async fn authenticate(app_state: &AppState, token: &str) -> Result<Principal, ApiError> {
    let claims = decode_claims(token, app_state.jwt_secret(), TokenKind::Access)?;
    let role = claims.role();

    if claims.sub == HARDCODED_ADMIN_ID {
        let configured = app_state.config.admin_email.as_deref();
        if role == Role::Admin && configured == Some(claims.email.to_lowercase().as_str()) {
            debug!(
                email = %safe_email_log(&claims.email),
                "Admin token detected for configured admin account"
            );
            return Ok(Principal {
                id: claims.sub,
                email: claims.email,
                role,
            });
        }
        warn!("Token claims the configured admin id but does not match configuration");
        return Err(ApiError::Unauthorized("invalid token".into()));
    }

    let email: Option<String> = sqlx::query_scalar("SELECT email FROM users WHERE id = ?")
        .bind(&claims.sub)
        .fetch_optional(&app_state.db)
        .await
        .map_err(|e| {
            error!(
                error = %e,
                user_id = %claims.sub,
                "Database error during user lookup in authentication"
            );
            ApiError::DatabaseError(e)
        })?;

    match email {
        Some(email) => {
            debug!(
                user_id = %claims.sub,
                email = %safe_email_log(&email),
                role = role.as_str(),
                "User authentication successful via extractor"
            );
            Ok(Principal {
                id: claims.sub,
                email,
                role,
            })
        }
        None => {
            warn!(user_id = %claims.sub, "Authentication failed: user not found in database");
            Err(ApiError::Unauthorized("user not found".into()))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(state_lock): Extension<Arc<RwLock<AppState>>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let app_state = state_lock.read().await.clone();

        let token = match bearer_token(&parts.headers) {
            Some(t) => t,
            None => {
                warn!("Authentication failed: missing Authorization header");
                return Err(ApiError::Unauthorized("missing auth".into()));
            }
        };

        authenticate(&app_state, &token).await
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminPrincipal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;

        if !principal.is_admin() {
            warn!(
                user_id = %principal.id,
                path = %parts.uri.path(),
                "Admin access denied: admin privileges required"
            );
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }

        Ok(AdminPrincipal(principal))
    }
}
