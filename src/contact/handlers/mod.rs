// src/contact/handlers/mod.rs

pub mod admin;
pub mod user;

use sqlx::SqlitePool;

use crate::common::ApiError;
use crate::contact::models::ContactSubmission;

pub async fn fetch_submission(
    pool: &SqlitePool,
    submission_id: &str,
) -> Result<ContactSubmission, ApiError> {
    sqlx::query_as::<_, ContactSubmission>("SELECT * FROM contact_submissions WHERE id = ?")
        .bind(submission_id)
        .fetch_optional(pool)
        .await
        .map_err(ApiError::DatabaseError)?
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))
}
