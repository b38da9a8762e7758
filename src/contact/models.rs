// src/contact/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::common::helpers::serialize_json_text;
use crate::common::PageParams;

// ============================================================================
// Submission Models
// ============================================================================

/// A profile review request as stored. Serializes in the admin shape,
/// with `analysis` rendered as an object (`{}` when absent).
#[derive(FromRow, Serialize, Debug, Clone)]
pub struct ContactSubmission {
    pub id: String,
    pub user_id: Option<String>,
    pub email: String,
    pub linkedin_url: String,
    pub message: String,
    pub is_processed: bool,
    pub admin_reply: Option<String>,
    pub admin_reply_date: Option<String>,
    #[serde(serialize_with = "serialize_json_text")]
    pub analysis: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// What a submitter sees of their own submission. Review results stay
/// hidden until the submission is processed.
#[derive(Serialize, Debug)]
pub struct UserSubmissionView {
    pub id: String,
    pub email: String,
    pub linkedin_url: String,
    pub message: String,
    pub is_processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_reply_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<serde_json::Value>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ContactSubmission> for UserSubmissionView {
    fn from(sub: ContactSubmission) -> Self {
        let processed = sub.is_processed;
        let analysis = sub
            .analysis
            .as_deref()
            .and_then(|raw| serde_json::from_str::<serde_json::Value>(raw).ok())
            .filter(|v| !v.is_null());

        Self {
            id: sub.id,
            email: sub.email,
            linkedin_url: sub.linkedin_url,
            message: sub.message,
            is_processed: processed,
            admin_reply: sub.admin_reply.filter(|_| processed),
            admin_reply_date: sub.admin_reply_date.filter(|_| processed),
            analysis: analysis.filter(|_| processed),
            created_at: sub.created_at,
            updated_at: sub.updated_at,
        }
    }
}

// ============================================================================
// Request Models
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct CreateSubmissionRequest {
    pub email: Option<String>,
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Admin edit. `is_processed` is derived and cannot be set directly.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateSubmissionRequest {
    pub admin_reply: Option<String>,
    pub analysis: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub reply: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SubmissionListQuery {
    pub status: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl SubmissionListQuery {
    pub fn page_params(&self) -> PageParams {
        PageParams {
            page: self.page.clone(),
            page_size: self.page_size.clone(),
        }
    }

    /// `Some(true)` for processed, `Some(false)` for pending, `None` for all
    pub fn processed_filter(&self) -> Option<bool> {
        match self.status.as_deref().map(str::trim) {
            Some("processed") => Some(true),
            Some("pending") => Some(false),
            _ => None,
        }
    }
}

// ============================================================================
// Response Models
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SubmissionCreatedResponse {
    pub message: String,
    pub submission: UserSubmissionView,
}

#[derive(Debug, Serialize)]
pub struct SubmissionList {
    pub submissions: Vec<ContactSubmission>,
    pub total_count: i64,
    pub total_pages: i64,
    pub current_page: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct SubmissionStats {
    pub total: i64,
    pub processed: i64,
    pub pending: i64,
}
