//! Authentication handlers

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::extractors::Principal;
use super::google::{verify_id_token, GoogleIdentity};
use super::models::{
    EmailOnlyRequest, GoogleAuthRequest, GoogleAuthResponse, LoginRequest, LoginResponse,
    PasswordResetConfirmRequest, ProfileResponse, RefreshRequest, Role, SignupRequest,
    SignupResponse, TokenKind, User, VerifyEmailRequest,
};
use super::password::{constant_time_eq, hash_password, verify_password};
use super::tokens::{
    decode_claims, issue_email_verification_token, issue_login_tokens,
    issue_password_reset_token, password_fingerprint, refresh_access_token, HARDCODED_ADMIN_ID,
};
use crate::common::validation::validate_new_password;
use crate::common::{generate_user_id, now_timestamp, safe_email_log, ApiError, AppState};
use crate::contact::validators::is_valid_email;
use crate::services::email;
use crate::subscriptions::handlers::load_subscription;
use crate::subscriptions::models::SubscriptionSummary;

/// POST /api/auth/login
///
/// The configured admin account is checked first and never touches the
/// database. Every failure is reported the same way.
pub async fn login(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    let email = payload.email.trim().to_lowercase();

    if let Some(admin) = &state.config.hardcoded_admin {
        if email == admin.email && constant_time_eq(&payload.password, &admin.password) {
            info!(email = %safe_email_log(&email), "Configured admin logged in");
            let (access, refresh) =
                issue_login_tokens(&state.config, HARDCODED_ADMIN_ID, &admin.email, Role::Admin)?;
            return Ok(Json(LoginResponse {
                access,
                refresh,
                user_id: HARDCODED_ADMIN_ID.to_string(),
                email: admin.email.clone(),
                role: Role::Admin,
                is_staff: true,
            }));
        }
    }

    let user = find_user_by_email(&state.db, &email).await?;
    let user = match user {
        Some(u) => u,
        None => {
            warn!(email = %safe_email_log(&email), "Login failed: unknown email");
            return Err(invalid_credentials());
        }
    };

    let password_ok = user
        .password_hash
        .as_deref()
        .map(|hash| verify_password(&payload.password, hash))
        .unwrap_or(false);
    if !password_ok {
        warn!(user_id = %user.id, "Login failed: wrong password");
        return Err(invalid_credentials());
    }

    let role = issuance_role(&state, &user);
    let (access, refresh) = issue_login_tokens(&state.config, &user.id, &user.email, role)?;

    info!(user_id = %user.id, role = role.as_str(), "User logged in");

    Ok(Json(LoginResponse {
        access,
        refresh,
        user_id: user.id,
        email: user.email,
        role,
        is_staff: user.is_staff,
    }))
}

/// POST /api/auth/signup
pub async fn signup(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let state = state_lock.read().await.clone();
    let email = payload.email.trim().to_lowercase();

    if !is_valid_email(&email) {
        return Err(ApiError::ValidationError(
            "email: Enter a valid email address.".to_string(),
        ));
    }
    validate_new_password(&payload.password, &payload.password2).into_result()?;

    if state.is_hardcoded_admin_email(&email)
        || find_user_by_email(&state.db, &email).await?.is_some()
    {
        warn!(email = %safe_email_log(&email), "Signup rejected: email already registered");
        return Err(ApiError::Conflict(
            "A user with this email already exists.".to_string(),
        ));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = insert_user(
        &state.db,
        NewUser {
            email: &email,
            password_hash: Some(&password_hash),
            email_verified: false,
            google_id: None,
            first_name: None,
            last_name: None,
        },
    )
    .await?;

    let role = issuance_role(&state, &user);
    let (access, _refresh) = issue_login_tokens(&state.config, &user.id, &user.email, role)?;

    send_verification_email(&state, &user)?;

    info!(user_id = %user.id, email = %safe_email_log(&user.email), "User signed up");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user,
            message: "User created successfully".to_string(),
            token: access,
        }),
    ))
}

/// POST /api/auth/refresh
pub async fn refresh(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let claims = decode_claims(&payload.refresh, state.jwt_secret(), TokenKind::Refresh)
        .map_err(|_| ApiError::Unauthorized("Invalid token. Please log in again.".to_string()))?;

    let access = refresh_access_token(&state.config, &claims)?;
    debug!(user_id = %claims.sub, "Access token refreshed");

    Ok(Json(json!({ "access": access })))
}

/// POST /api/auth/google
///
/// `action` is `login` (default) or `signup`. Login never creates an
/// account and signup never reuses one.
pub async fn google_auth(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<GoogleAuthRequest>,
) -> Result<Response, ApiError> {
    info!("🔐 Received Google auth request");
    let state = state_lock.read().await.clone();

    let credential = payload
        .credential
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Google credential is required".to_string()))?;
    let is_signup = payload.action.as_deref() == Some("signup");

    let identity = verify_id_token(
        &state.http,
        &state.config.google_tokeninfo_url,
        credential,
        state.config.google_client_id.as_deref(),
    )
    .await?;

    let existing = find_user_by_email(&state.db, &identity.email).await?;
    let reserved = state.is_hardcoded_admin_email(&identity.email);

    let (user, is_new_user) = match (existing, is_signup) {
        (None, false) => {
            info!(email = %safe_email_log(&identity.email), "Google login for unknown account");
            return Ok((
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "No account exists with this email. Please sign up first.",
                    "needs_signup": true,
                })),
            )
                .into_response());
        }
        (Some(user), false) => (link_google_account(&state.db, user, &identity).await?, false),
        (None, true) if !reserved => {
            let user = insert_user(
                &state.db,
                NewUser {
                    email: &identity.email,
                    password_hash: None,
                    email_verified: identity.email_verified,
                    google_id: identity.subject.as_deref(),
                    first_name: identity.given_name.as_deref(),
                    last_name: identity.family_name.as_deref(),
                },
            )
            .await?;
            info!(user_id = %user.id, "User created from Google signup");
            (user, true)
        }
        (_, true) => {
            info!(email = %safe_email_log(&identity.email), "Google signup for existing account");
            return Ok((
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "An account already exists with this email. Please log in instead.",
                    "needs_login": true,
                })),
            )
                .into_response());
        }
    };

    let role = issuance_role(&state, &user);
    let (access, refresh) = issue_login_tokens(&state.config, &user.id, &user.email, role)?;

    Ok(Json(GoogleAuthResponse {
        tokens: LoginResponse {
            access,
            refresh,
            user_id: user.id,
            email: user.email,
            role,
            is_staff: user.is_staff,
        },
        is_new_user,
    })
    .into_response())
}

/// POST /api/auth/verify-email
pub async fn verify_email(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<VerifyEmailRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let invalid = || ApiError::BadRequest("Invalid or expired verification token".to_string());

    let claims = decode_claims(
        &payload.token,
        state.jwt_secret(),
        TokenKind::EmailVerification,
    )
    .map_err(|_| invalid())?;

    let result = sqlx::query(
        "UPDATE users SET email_verified = 1, updated_at = ? WHERE id = ? AND email = ?",
    )
    .bind(now_timestamp())
    .bind(&claims.sub)
    .bind(&claims.email)
    .execute(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    if result.rows_affected() == 0 {
        warn!(user_id = %claims.sub, "Verification token does not match any user");
        return Err(invalid());
    }

    info!(user_id = %claims.sub, "Email verified");
    Ok(Json(json!({ "message": "Email verified successfully" })))
}

/// POST /api/auth/resend-verification
///
/// Always answers the same way so the endpoint cannot be used to probe
/// which emails are registered.
pub async fn resend_verification(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<EmailOnlyRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let email = payload.email.trim().to_lowercase();

    match find_user_by_email(&state.db, &email).await? {
        Some(user) if !user.email_verified => send_verification_email(&state, &user)?,
        Some(_) => debug!(email = %safe_email_log(&email), "Email already verified"),
        None => debug!(email = %safe_email_log(&email), "Resend requested for unknown email"),
    }

    Ok(Json(json!({
        "message": "If an unverified account exists for this email, a verification email has been sent."
    })))
}

/// POST /api/auth/password-reset
pub async fn password_reset(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Json(payload): Json<EmailOnlyRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let email = payload.email.trim().to_lowercase();

    if let Some(user) = find_user_by_email(&state.db, &email).await? {
        let token = issue_password_reset_token(
            &state.config,
            &user.id,
            &user.email,
            user.password_hash.as_deref(),
        )?;
        let reset_url = format!(
            "{}/reset-password/{}/{}",
            state.config.frontend_url, user.id, token
        );
        state
            .email_service
            .dispatch(email::password_reset(&user.email, &reset_url));
        info!(user_id = %user.id, "Password reset email queued");
    } else {
        debug!(email = %safe_email_log(&email), "Password reset requested for unknown email");
    }

    Ok(Json(json!({ "message": "Password reset email has been sent." })))
}

/// POST /api/auth/password-reset/:uid/:token
///
/// The token carries a fingerprint of the password hash it was issued
/// against, so it stops working once the password changes.
pub async fn password_reset_confirm(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path((uid, token)): Path<(String, String)>,
    Json(payload): Json<PasswordResetConfirmRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let invalid = || ApiError::BadRequest("Invalid token".to_string());

    let claims = decode_claims(&token, state.jwt_secret(), TokenKind::PasswordReset)
        .map_err(|_| invalid())?;
    if claims.sub != uid {
        warn!(user_id = %uid, "Password reset token issued for another user");
        return Err(invalid());
    }

    let user = find_user_by_id(&state.db, &uid).await?.ok_or_else(invalid)?;
    let current = password_fingerprint(user.password_hash.as_deref());
    if claims.fingerprint.as_deref() != Some(current.as_str()) {
        warn!(user_id = %uid, "Password reset token already used or outdated");
        return Err(invalid());
    }

    validate_new_password(&payload.password, &payload.password2).into_result()?;
    let password_hash = hash_password(&payload.password)?;

    sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(&password_hash)
        .bind(now_timestamp())
        .bind(&uid)
        .execute(&state.db)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %uid, "Database error updating password");
            ApiError::DatabaseError(e)
        })?;

    info!(user_id = %uid, "Password reset completed");
    Ok(Json(json!({ "message": "Password has been reset successfully." })))
}

/// GET /api/auth/profile
pub async fn profile(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    principal: Principal,
) -> Result<Json<ProfileResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    let now = Utc::now();

    if principal.is_hardcoded_admin() {
        return Ok(Json(ProfileResponse {
            id: principal.id,
            email: principal.email,
            role: Role::Admin,
            is_staff: true,
            email_verified: true,
            first_name: None,
            last_name: None,
            date_joined: None,
            subscription: SubscriptionSummary::from_subscription(None, now),
        }));
    }

    let user = find_user_by_id(&state.db, &principal.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    let subscription = load_subscription(&state.db, &user.id).await?;

    Ok(Json(ProfileResponse {
        id: user.id,
        email: user.email,
        role: principal.role,
        is_staff: user.is_staff,
        email_verified: user.email_verified,
        first_name: user.first_name,
        last_name: user.last_name,
        date_joined: Some(user.created_at),
        subscription: SubscriptionSummary::from_subscription(subscription.as_ref(), now),
    }))
}

/// POST /api/auth/logout
///
/// Tokens are stateless; the client discards them.
pub async fn logout(principal: Principal) -> Json<serde_json::Value> {
    info!(user_id = %principal.id, "User logged out");
    Json(json!({ "message": "Successfully logged out" }))
}

// ---- Helper Functions ----

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid credentials".to_string())
}

/// Role written into freshly issued tokens. Membership in the admin email
/// list only counts once the address has been verified.
fn issuance_role(state: &AppState, user: &User) -> Role {
    Role::from_admin_flag(
        user.role == Role::Admin.as_str()
            || user.is_staff
            || (user.email_verified && state.is_admin_email(&user.email)),
    )
}

fn send_verification_email(state: &AppState, user: &User) -> Result<(), ApiError> {
    let token = issue_email_verification_token(&state.config, &user.id, &user.email)?;
    let url = format!("{}/verify-email/{}", state.config.frontend_url, token);
    state
        .email_service
        .dispatch(email::email_verification(&user.email, &url));
    debug!(user_id = %user.id, "Verification email queued");
    Ok(())
}

pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, ApiError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            error!(error = %e, email = %safe_email_log(email), "Database error looking up user");
            ApiError::DatabaseError(e)
        })
}

pub async fn find_user_by_id(pool: &SqlitePool, id: &str) -> Result<Option<User>, ApiError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(ApiError::DatabaseError)
}

struct NewUser<'a> {
    email: &'a str,
    password_hash: Option<&'a str>,
    email_verified: bool,
    google_id: Option<&'a str>,
    first_name: Option<&'a str>,
    last_name: Option<&'a str>,
}

async fn insert_user(pool: &SqlitePool, new_user: NewUser<'_>) -> Result<User, ApiError> {
    let id = generate_user_id();
    let now = now_timestamp();

    sqlx::query(
        r#"
        INSERT INTO users (id, email, password_hash, role, is_staff, email_verified,
                           google_id, first_name, last_name, created_at, updated_at)
        VALUES (?, ?, ?, 'user', 0, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(new_user.email)
    .bind(new_user.password_hash)
    .bind(new_user.email_verified)
    .bind(new_user.google_id)
    .bind(new_user.first_name)
    .bind(new_user.last_name)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return ApiError::Conflict("A user with this email already exists.".to_string());
            }
        }
        error!(error = %e, "Database error creating user");
        ApiError::DatabaseError(e)
    })?;

    find_user_by_id(pool, &id)
        .await?
        .ok_or_else(|| ApiError::InternalServer("user not saved".to_string()))
}

/// Records the Google subject on an existing account the first time it
/// signs in through Google. An email Google has not verified is only
/// accepted for an account already linked to the same subject.
async fn link_google_account(
    pool: &SqlitePool,
    user: User,
    identity: &GoogleIdentity,
) -> Result<User, ApiError> {
    let already_linked =
        user.google_id.is_some() && user.google_id.as_deref() == identity.subject.as_deref();
    if !already_linked && !identity.email_verified {
        warn!(user_id = %user.id, "Google login rejected: email not verified by Google");
        return Err(ApiError::Unauthorized(
            "Google account email is not verified".to_string(),
        ));
    }
    if user.google_id.is_some() || identity.subject.is_none() {
        return Ok(user);
    }

    sqlx::query(
        "UPDATE users SET google_id = ?, email_verified = email_verified OR ?, updated_at = ? WHERE id = ?",
    )
    .bind(identity.subject.as_deref())
    .bind(identity.email_verified)
    .bind(now_timestamp())
    .bind(&user.id)
    .execute(pool)
    .await
    .map_err(ApiError::DatabaseError)?;

    debug!(user_id = %user.id, "Linked Google account");
    find_user_by_id(pool, &user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}
