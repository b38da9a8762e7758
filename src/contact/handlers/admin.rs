// src/contact/handlers/admin.rs
//! Admin review workflow over contact submissions

use axum::extract::{Extension, Json, Path, Query};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::auth::AdminPrincipal;
use crate::common::{now_timestamp, ApiError, AppState, PageWindow};
use crate::contact::handlers::fetch_submission;
use crate::contact::models::{
    ContactSubmission, ReplyRequest, SubmissionList, SubmissionListQuery, SubmissionStats,
    UpdateSubmissionRequest,
};
use crate::services::email;

/// GET /api/admin/submissions?status=pending|processed
pub async fn list_submissions(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    admin: AdminPrincipal,
    Query(query): Query<SubmissionListQuery>,
) -> Result<Json<SubmissionList>, ApiError> {
    let state = state_lock.read().await.clone();
    let list = paginate(&state, &query, query.processed_filter()).await?;

    debug!(
        admin_user_id = %admin.id,
        count = list.submissions.len(),
        page = list.current_page,
        "Admin submission list fetched"
    );
    Ok(Json(list))
}

/// GET /api/admin/processed
pub async fn list_processed(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    _admin: AdminPrincipal,
    Query(query): Query<SubmissionListQuery>,
) -> Result<Json<SubmissionList>, ApiError> {
    let state = state_lock.read().await.clone();
    Ok(Json(paginate(&state, &query, Some(true)).await?))
}

/// GET /api/admin/submissions/:id
pub async fn get_submission(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    _admin: AdminPrincipal,
    Path(submission_id): Path<String>,
) -> Result<Json<ContactSubmission>, ApiError> {
    let state = state_lock.read().await.clone();
    Ok(Json(fetch_submission(&state.db, &submission_id).await?))
}

/// GET /api/admin/processed/:id
pub async fn get_processed(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    _admin: AdminPrincipal,
    Path(submission_id): Path<String>,
) -> Result<Json<ContactSubmission>, ApiError> {
    let state = state_lock.read().await.clone();
    let submission = fetch_submission(&state.db, &submission_id).await?;
    if !submission.is_processed {
        return Err(ApiError::NotFound("Submission not found".to_string()));
    }
    Ok(Json(submission))
}

/// PATCH /api/admin/submissions/:id
///
/// A non-empty reply marks the submission processed; an empty one clears
/// the stored reply. Recording an analysis also marks it processed.
pub async fn update_submission(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    admin: AdminPrincipal,
    Path(submission_id): Path<String>,
    Json(payload): Json<UpdateSubmissionRequest>,
) -> Result<Json<ContactSubmission>, ApiError> {
    let state = state_lock.read().await.clone();
    let mut submission = fetch_submission(&state.db, &submission_id).await?;

    if let Some(reply) = payload.admin_reply.as_deref() {
        submission = if reply.trim().is_empty() {
            clear_reply(&state, &submission.id).await?
        } else {
            record_reply(&state, submission, reply.trim()).await?
        };
    }

    if let Some(analysis) = payload.analysis.as_ref().filter(|v| !v.is_null()) {
        let document = serde_json::to_string(analysis)
            .map_err(|e| ApiError::BadRequest(format!("analysis: {}", e)))?;
        sqlx::query(
            "UPDATE contact_submissions SET analysis = ?, is_processed = 1, updated_at = ? WHERE id = ?",
        )
        .bind(&document)
        .bind(now_timestamp())
        .bind(&submission.id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;
        submission = fetch_submission(&state.db, &submission.id).await?;
        info!(admin_user_id = %admin.id, submission_id = %submission.id, "Submission analysis recorded");
    }

    Ok(Json(submission))
}

/// POST /api/admin/submissions/:id/reply
pub async fn reply_to_submission(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    admin: AdminPrincipal,
    Path(submission_id): Path<String>,
    Json(payload): Json<ReplyRequest>,
) -> Result<Json<ContactSubmission>, ApiError> {
    let reply = payload
        .reply
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Reply message is required".to_string()))?
        .to_string();

    let state = state_lock.read().await.clone();
    let submission = fetch_submission(&state.db, &submission_id).await?;
    let submission = record_reply(&state, submission, &reply).await?;

    info!(admin_user_id = %admin.id, submission_id = %submission.id, "Admin reply recorded");
    Ok(Json(submission))
}

/// GET /api/admin/stats
pub async fn submission_stats(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    _admin: AdminPrincipal,
) -> Result<Json<SubmissionStats>, ApiError> {
    let state = state_lock.read().await.clone();

    let stats = sqlx::query_as::<_, SubmissionStats>(
        r#"
        SELECT COUNT(*) AS total,
               COALESCE(SUM(CASE WHEN is_processed = 1 THEN 1 ELSE 0 END), 0) AS processed,
               COALESCE(SUM(CASE WHEN is_processed = 0 THEN 1 ELSE 0 END), 0) AS pending
        FROM contact_submissions
        "#,
    )
    .fetch_one(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    Ok(Json(stats))
}

// ---- Helper Functions ----

async fn paginate(
    state: &AppState,
    query: &SubmissionListQuery,
    processed: Option<bool>,
) -> Result<SubmissionList, ApiError> {
    // -1 never matches, so `None` selects every row
    let filter: i64 = match processed {
        Some(true) => 1,
        Some(false) => 0,
        None => -1,
    };

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM contact_submissions WHERE (? = -1 OR is_processed = ?)",
    )
    .bind(filter)
    .bind(filter)
    .fetch_one(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let window = PageWindow::resolve(&query.page_params(), total);

    let submissions = sqlx::query_as::<_, ContactSubmission>(
        r#"
        SELECT * FROM contact_submissions
        WHERE (? = -1 OR is_processed = ?)
        ORDER BY created_at DESC, rowid DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(filter)
    .bind(filter)
    .bind(window.limit())
    .bind(window.offset())
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    Ok(SubmissionList {
        submissions,
        total_count: window.total_count,
        total_pages: window.total_pages,
        current_page: window.page,
    })
}

/// Stores the reply, stamps the reply date and marks the submission
/// processed. The submitter is emailed only when the text changed.
async fn record_reply(
    state: &AppState,
    submission: ContactSubmission,
    reply: &str,
) -> Result<ContactSubmission, ApiError> {
    let changed = submission.admin_reply.as_deref() != Some(reply);
    let now = now_timestamp();

    sqlx::query(
        r#"
        UPDATE contact_submissions
        SET admin_reply = ?, admin_reply_date = ?, is_processed = 1, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(reply)
    .bind(&now)
    .bind(&now)
    .bind(&submission.id)
    .execute(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, submission_id = %submission.id, "Database error saving admin reply");
        ApiError::DatabaseError(e)
    })?;

    if changed {
        state.email_service.dispatch(email::admin_reply(
            &submission.email,
            reply,
            &submission.message,
            &submission.linkedin_url,
        ));
    } else {
        debug!(submission_id = %submission.id, "Reply unchanged; not emailing submitter again");
    }

    fetch_submission(&state.db, &submission.id).await
}

async fn clear_reply(state: &AppState, submission_id: &str) -> Result<ContactSubmission, ApiError> {
    sqlx::query(
        "UPDATE contact_submissions SET admin_reply = NULL, updated_at = ? WHERE id = ?",
    )
    .bind(now_timestamp())
    .bind(submission_id)
    .execute(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    fetch_submission(&state.db, submission_id).await
}
