// src/contact/handlers/user.rs
//! Submission endpoints for signed-in users

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::auth::Principal;
use crate::common::{
    generate_submission_id, now_timestamp, safe_email_log, ApiError, AppState, Validator,
};
use crate::contact::handlers::fetch_submission;
use crate::contact::models::{
    ContactSubmission, CreateSubmissionRequest, SubmissionCreatedResponse, UserSubmissionView,
};
use crate::contact::validators::SubmissionValidator;
use crate::services::email;
use crate::subscriptions::handlers::ensure_submission_quota;

/// POST /api/contact/submit
pub async fn submit(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    principal: Principal,
    Json(payload): Json<CreateSubmissionRequest>,
) -> Result<(StatusCode, Json<SubmissionCreatedResponse>), ApiError> {
    SubmissionValidator.validate(&payload).into_result()?;

    let state = state_lock.read().await.clone();

    let email = payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .unwrap_or(principal.email.as_str())
        .to_lowercase();
    let linkedin_url = payload
        .linkedin_url
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    let message = payload.message.unwrap_or_default();

    ensure_submission_quota(&state.db, &principal).await?;

    // The configured admin has no users row to point at
    let user_id = if principal.is_hardcoded_admin() {
        None
    } else {
        Some(principal.id.clone())
    };

    let submission_id = generate_submission_id();
    let now = now_timestamp();

    sqlx::query(
        r#"
        INSERT INTO contact_submissions (id, user_id, email, linkedin_url, message, is_processed, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(&submission_id)
    .bind(user_id.as_deref())
    .bind(&email)
    .bind(&linkedin_url)
    .bind(&message)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await
    .map_err(|e| {
        error!(
            error = %e,
            user_id = %principal.id,
            submission_id = %submission_id,
            "Database error inserting contact submission"
        );
        ApiError::DatabaseError(e)
    })?;

    let submission = fetch_submission(&state.db, &submission_id).await?;

    match state.config.admin_email.as_deref() {
        Some(admin_email) => {
            state.email_service.dispatch(email::submission_notification(
                admin_email,
                &submission.email,
                &submission.linkedin_url,
                &submission.message,
            ));
        }
        None => warn!("ADMIN_EMAIL not configured; skipping submission notification"),
    }

    info!(
        submission_id = %submission.id,
        user_id = %principal.id,
        email = %safe_email_log(&submission.email),
        "Contact submission received"
    );

    Ok((
        StatusCode::CREATED,
        Json(SubmissionCreatedResponse {
            message: "Your message has been sent successfully! We'll contact you soon."
                .to_string(),
            submission: submission.into(),
        }),
    ))
}

/// GET /api/contact/user-submissions
pub async fn list_own_submissions(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    principal: Principal,
) -> Result<Json<Vec<UserSubmissionView>>, ApiError> {
    let state = state_lock.read().await.clone();

    let submissions = sqlx::query_as::<_, ContactSubmission>(
        r#"
        SELECT * FROM contact_submissions
        WHERE user_id = ? OR lower(email) = lower(?)
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(&principal.id)
    .bind(&principal.email)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    Ok(Json(submissions.into_iter().map(Into::into).collect()))
}

/// GET /api/contact/user-submissions/:id
pub async fn get_own_submission(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    principal: Principal,
    Path(submission_id): Path<String>,
) -> Result<Json<UserSubmissionView>, ApiError> {
    let state = state_lock.read().await.clone();

    let submission = sqlx::query_as::<_, ContactSubmission>(
        r#"
        SELECT * FROM contact_submissions
        WHERE id = ? AND (user_id = ? OR lower(email) = lower(?))
        "#,
    )
    .bind(&submission_id)
    .bind(&principal.id)
    .bind(&principal.email)
    .fetch_optional(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?
    .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;

    Ok(Json(submission.into()))
}
