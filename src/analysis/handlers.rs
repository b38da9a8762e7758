// src/analysis/handlers.rs

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
};
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::models::{
    AnalysisStatus, DashboardStats, ProfileAnalysisRow, ProfileAnalysisView, RiskDistribution,
};
use super::validators::AnalysisInput;
use crate::auth::AdminPrincipal;
use crate::common::{generate_analysis_id, now_timestamp, ApiError, AppState};
use crate::contact::handlers::fetch_submission;

const ANALYSIS_SELECT: &str = r#"
    SELECT a.id, a.submission_id, a.analyzed_by, a.signals, a.summary, a.score, a.risk_level,
           a.created_at, a.updated_at,
           s.email AS submission_email, s.linkedin_url AS submission_url,
           s.created_at AS submission_date
    FROM profile_analyses a
    JOIN contact_submissions s ON s.id = a.submission_id
"#;

/// POST /api/admin/analyses
///
/// Creates the analysis and marks its submission processed in one
/// transaction.
pub async fn create_analysis(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    admin: AdminPrincipal,
    Json(body): Json<Map<String, Value>>,
) -> Result<(StatusCode, Json<ProfileAnalysisView>), ApiError> {
    let submission_id = match body.get("submission_id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            return Err(ApiError::ValidationError(
                "submission_id: This field is required.".to_string(),
            ))
        }
    };

    let input = AnalysisInput::default().apply(&body)?;

    let state = state_lock.read().await.clone();
    let mut tx = state.db.begin().await.map_err(ApiError::DatabaseError)?;

    let submission_exists: Option<String> =
        sqlx::query_scalar("SELECT id FROM contact_submissions WHERE id = ?")
            .bind(&submission_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(ApiError::DatabaseError)?;
    if submission_exists.is_none() {
        warn!(submission_id = %submission_id, "Analysis requested for unknown submission");
        return Err(ApiError::ValidationError(
            "submission_id: Submission not found".to_string(),
        ));
    }

    let existing: Option<String> =
        sqlx::query_scalar("SELECT id FROM profile_analyses WHERE submission_id = ?")
            .bind(&submission_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(ApiError::DatabaseError)?;
    if existing.is_some() {
        return Err(duplicate_analysis());
    }

    let analysis_id = generate_analysis_id();
    let now = now_timestamp();
    let signals = serialize_signals(&input)?;

    sqlx::query(
        r#"
        INSERT INTO profile_analyses (id, submission_id, analyzed_by, signals, summary, score, risk_level, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&analysis_id)
    .bind(&submission_id)
    .bind(&admin.id)
    .bind(&signals)
    .bind(&input.summary)
    .bind(input.score)
    .bind(input.risk_level.as_str())
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await
    .map_err(|e| analysis_insert_error(e, &submission_id))?;

    sqlx::query("UPDATE contact_submissions SET is_processed = 1, updated_at = ? WHERE id = ?")
        .bind(&now)
        .bind(&submission_id)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::DatabaseError)?;

    tx.commit().await.map_err(ApiError::DatabaseError)?;

    info!(
        admin_user_id = %admin.id,
        analysis_id = %analysis_id,
        submission_id = %submission_id,
        risk_level = input.risk_level.as_str(),
        "Profile analysis created"
    );

    let view = fetch_analysis(&state.db, &analysis_id).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/admin/analyses/:id
pub async fn get_analysis(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    _admin: AdminPrincipal,
    Path(analysis_id): Path<String>,
) -> Result<Json<ProfileAnalysisView>, ApiError> {
    let state = state_lock.read().await.clone();
    Ok(Json(fetch_analysis(&state.db, &analysis_id).await?))
}

/// PUT /api/admin/analyses/:id - partial update
pub async fn update_analysis(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    admin: AdminPrincipal,
    Path(analysis_id): Path<String>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Json<ProfileAnalysisView>, ApiError> {
    let state = state_lock.read().await.clone();
    let current = fetch_analysis(&state.db, &analysis_id).await?;

    let input = AnalysisInput {
        signals: current.signals,
        summary: current.summary,
        score: current.score,
        risk_level: current.risk_level,
    }
    .apply(&body)?;

    sqlx::query(
        r#"
        UPDATE profile_analyses
        SET signals = ?, summary = ?, score = ?, risk_level = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(serialize_signals(&input)?)
    .bind(&input.summary)
    .bind(input.score)
    .bind(input.risk_level.as_str())
    .bind(now_timestamp())
    .bind(&analysis_id)
    .execute(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, analysis_id = %analysis_id, "Database error updating analysis");
        ApiError::DatabaseError(e)
    })?;

    info!(admin_user_id = %admin.id, analysis_id = %analysis_id, "Profile analysis updated");
    Ok(Json(fetch_analysis(&state.db, &analysis_id).await?))
}

/// DELETE /api/admin/analyses/:id
///
/// The submission keeps its processed flag.
pub async fn delete_analysis(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    admin: AdminPrincipal,
    Path(analysis_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let state = state_lock.read().await.clone();

    let result = sqlx::query("DELETE FROM profile_analyses WHERE id = ?")
        .bind(&analysis_id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Analysis not found".to_string()));
    }

    info!(admin_user_id = %admin.id, analysis_id = %analysis_id, "Profile analysis deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/admin/submissions/:id/analysis-status
pub async fn analysis_status(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    _admin: AdminPrincipal,
    Path(submission_id): Path<String>,
) -> Result<Json<AnalysisStatus>, ApiError> {
    let state = state_lock.read().await.clone();
    fetch_submission(&state.db, &submission_id).await?;

    let analysis_id: Option<String> =
        sqlx::query_scalar("SELECT id FROM profile_analyses WHERE submission_id = ?")
            .bind(&submission_id)
            .fetch_optional(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?;

    Ok(Json(AnalysisStatus {
        has_analysis: analysis_id.is_some(),
        analysis_id,
    }))
}

/// GET /api/admin/dashboard/stats
pub async fn dashboard_stats(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    _admin: AdminPrincipal,
) -> Result<Json<DashboardStats>, ApiError> {
    let state = state_lock.read().await.clone();

    let (total, processed): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*), COALESCE(SUM(CASE WHEN is_processed = 1 THEN 1 ELSE 0 END), 0)
        FROM contact_submissions
        "#,
    )
    .fetch_one(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let risk_rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT risk_level, COUNT(*) FROM profile_analyses GROUP BY risk_level")
            .fetch_all(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?;

    let mut risk_distribution = RiskDistribution::default();
    for (level, count) in risk_rows {
        match level.as_str() {
            "low" => risk_distribution.low = count,
            "medium" => risk_distribution.medium = count,
            "high" => risk_distribution.high = count,
            _ => {}
        }
    }
    let analyzed = risk_distribution.low + risk_distribution.medium + risk_distribution.high;

    Ok(Json(DashboardStats {
        total_submissions: total,
        processed_submissions: processed,
        pending_submissions: total - processed,
        analyzed_submissions: analyzed,
        risk_distribution,
    }))
}

// ---- Helper Functions ----

async fn fetch_analysis(pool: &SqlitePool, analysis_id: &str) -> Result<ProfileAnalysisView, ApiError> {
    sqlx::query_as::<_, ProfileAnalysisRow>(&format!("{} WHERE a.id = ?", ANALYSIS_SELECT))
        .bind(analysis_id)
        .fetch_optional(pool)
        .await
        .map_err(ApiError::DatabaseError)?
        .map(ProfileAnalysisView::from)
        .ok_or_else(|| ApiError::NotFound("Analysis not found".to_string()))
}

/// A concurrent create that lost the race on the UNIQUE submission_id
/// surfaces as a conflict, like the pre-insert lookup in create_analysis.
pub(super) fn analysis_insert_error(e: sqlx::Error, submission_id: &str) -> ApiError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            warn!(submission_id = %submission_id, "Concurrent analysis create rejected");
            return duplicate_analysis();
        }
    }
    error!(error = %e, submission_id = %submission_id, "Database error inserting analysis");
    ApiError::DatabaseError(e)
}

fn duplicate_analysis() -> ApiError {
    ApiError::Conflict("An analysis already exists for this submission".to_string())
}

fn serialize_signals(input: &AnalysisInput) -> Result<String, ApiError> {
    serde_json::to_string(&input.signals).map_err(|e| {
        error!(error = %e, "Failed to serialize profile signals");
        ApiError::InternalServer("failed to store analysis".to_string())
    })
}
