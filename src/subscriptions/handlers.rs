// src/subscriptions/handlers.rs

use axum::extract::{Extension, Json, Query};
use chrono::{Duration, SecondsFormat, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::models::{
    AdminUserList, AdminUserView, AssignSubscriptionRequest, AssignSubscriptionResponse, Tier,
    UserSubscription, UserWithSubscriptionRow, QUOTA_WINDOW_DAYS,
};
use crate::auth::{AdminPrincipal, Principal};
use crate::common::{
    generate_subscription_id, now_timestamp, safe_email_log, ApiError, AppState, PageParams,
    PageWindow,
};

/// POST /api/admin/subscriptions - Create or replace a user's subscription
pub async fn assign_subscription(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    admin: AdminPrincipal,
    Json(request): Json<AssignSubscriptionRequest>,
) -> Result<Json<AssignSubscriptionResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let email = request
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty());
    let tier_name = request
        .tier
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let (email, tier_name) = match (email, tier_name) {
        (Some(e), Some(t)) => (e, t),
        _ => {
            return Err(ApiError::BadRequest(
                "Email and tier are required".to_string(),
            ))
        }
    };

    let tier: Tier = tier_name.parse().map_err(ApiError::BadRequest)?;
    let valid_for_days = request.valid_for_days();

    let now = Utc::now();
    let end_date = if tier != Tier::Free && valid_for_days > 0 {
        let end = Duration::try_days(valid_for_days)
            .and_then(|window| now.checked_add_signed(window))
            .ok_or_else(|| {
                warn!(valid_for_days = valid_for_days, "Subscription window out of range");
                ApiError::BadRequest("valid_for_days is out of range".to_string())
            })?;
        Some(end.to_rfc3339_opts(SecondsFormat::Micros, true))
    } else {
        None
    };

    let user_id: Option<String> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    let user_id = match user_id {
        Some(id) => id,
        None => {
            warn!(email = %safe_email_log(&email), "Subscription target user not found");
            return Err(ApiError::NotFound(format!(
                "User with email {} not found",
                email
            )));
        }
    };

    let existing = load_subscription(&state.db, &user_id).await?;
    let created = existing.is_none();
    let timestamp = now_timestamp();

    sqlx::query(
        r#"
        INSERT INTO user_subscriptions (id, user_id, tier, start_date, end_date, notes, assigned_by, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            tier = excluded.tier,
            end_date = excluded.end_date,
            notes = COALESCE(excluded.notes, user_subscriptions.notes),
            assigned_by = excluded.assigned_by,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(generate_subscription_id())
    .bind(&user_id)
    .bind(tier.as_str())
    .bind(&timestamp)
    .bind(end_date.as_deref())
    .bind(request.notes.as_deref())
    .bind(&admin.id)
    .bind(&timestamp)
    .execute(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, user_id = %user_id, "Database error saving subscription");
        ApiError::DatabaseError(e)
    })?;

    let subscription = load_subscription(&state.db, &user_id)
        .await?
        .ok_or_else(|| ApiError::InternalServer("subscription not saved".to_string()))?;

    info!(
        admin_user_id = %admin.id,
        user_id = %user_id,
        tier = %tier,
        created = created,
        "Subscription updated"
    );

    Ok(Json(AssignSubscriptionResponse {
        message: format!("Subscription updated for {}", email),
        tier: subscription.tier(),
        end_date: subscription.end_date.clone(),
        is_active: subscription.is_active_at(Utc::now()),
        created,
    }))
}

/// GET /api/admin/users - Paginated user list with effective tiers
pub async fn list_users(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    admin: AdminPrincipal,
    Query(params): Query<PageParams>,
) -> Result<Json<AdminUserList>, ApiError> {
    let state = state_lock.read().await.clone();

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;
    let window = PageWindow::resolve(&params, total);

    let rows = sqlx::query_as::<_, UserWithSubscriptionRow>(
        r#"
        SELECT u.id, u.email, u.role, u.is_staff, u.email_verified, u.created_at,
               s.id AS sub_id, s.tier, s.start_date, s.end_date, s.notes, s.assigned_by,
               s.updated_at AS sub_updated_at
        FROM users u
        LEFT JOIN user_subscriptions s ON s.user_id = u.id
        ORDER BY u.created_at DESC, u.rowid DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(window.limit())
    .bind(window.offset())
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let now = Utc::now();
    let users = rows
        .into_iter()
        .map(|row| {
            let subscription = row.subscription();
            let (tier, active, end_date) = match &subscription {
                Some(sub) => (
                    sub.effective_tier_at(now),
                    sub.is_active_at(now),
                    sub.end_date.clone(),
                ),
                None => (Tier::Free, true, None),
            };
            AdminUserView {
                id: row.id,
                email: row.email,
                role: row.role,
                is_staff: row.is_staff,
                email_verified: row.email_verified,
                date_joined: row.created_at,
                tier,
                subscription_active: active,
                subscription_end_date: end_date,
            }
        })
        .collect::<Vec<_>>();

    info!(
        admin_user_id = %admin.id,
        user_count = users.len(),
        page = window.page,
        "Admin user list fetched"
    );

    Ok(Json(AdminUserList {
        users,
        total_count: window.total_count,
        total_pages: window.total_pages,
        current_page: window.page,
    }))
}

// ---- Helper Functions ----

pub async fn load_subscription(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Option<UserSubscription>, ApiError> {
    sqlx::query_as::<_, UserSubscription>("SELECT * FROM user_subscriptions WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %user_id, "Database error loading subscription");
            ApiError::DatabaseError(e)
        })
}

/// Rejects a new submission once the principal's tier quota for the
/// rolling window is used up. Admins are never limited.
pub async fn ensure_submission_quota(
    pool: &SqlitePool,
    principal: &Principal,
) -> Result<(), ApiError> {
    if principal.is_admin() {
        return Ok(());
    }

    let now = Utc::now();
    let tier = load_subscription(pool, &principal.id)
        .await?
        .map(|sub| sub.effective_tier_at(now))
        .unwrap_or(Tier::Free);

    let quota = match tier.submission_quota() {
        Some(q) => q,
        None => return Ok(()),
    };

    let cutoff = (now - Duration::days(QUOTA_WINDOW_DAYS)).to_rfc3339_opts(SecondsFormat::Micros, true);
    let used: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM contact_submissions WHERE user_id = ? AND created_at >= ?",
    )
    .bind(&principal.id)
    .bind(&cutoff)
    .fetch_one(pool)
    .await
    .map_err(ApiError::DatabaseError)?;

    if used >= quota {
        warn!(
            user_id = %principal.id,
            tier = %tier,
            used = used,
            quota = quota,
            "Submission quota exhausted"
        );
        return Err(ApiError::QuotaExceeded(format!(
            "Submission limit reached for the {} tier ({} per {} days)",
            tier, quota, QUOTA_WINDOW_DAYS
        )));
    }

    Ok(())
}
