// src/analysis/models.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use std::str::FromStr;

pub const MAX_SCORE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(format!("\"{}\" is not a valid choice.", other)),
        }
    }
}

// ============================================================================
// Profile Signals
// ============================================================================

/// Everything the reviewer records about a profile, grouped the way the
/// review form presents it. Stored as one JSON document per analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSignals {
    // Profile basics
    pub connections: Option<u32>,
    pub has_verification_shield: bool,
    pub account_type: String,
    pub account_age_years: Option<u32>,
    pub last_updated: Option<NaiveDate>,
    pub has_custom_url: bool,

    // Profile quality
    pub has_profile_summary: bool,
    pub has_professional_photo: bool,
    pub has_old_photo: bool,
    pub outdated_job_info: bool,
    pub missing_about_or_education: bool,
    pub profile_completeness: bool,
    pub skills_endorsements_count: Option<u32>,
    pub has_recommendations: bool,
    pub personalized_profile: bool,

    // Activity
    pub recent_activity: bool,
    pub last_post_date: Option<NaiveDate>,
    pub engagement_with_content: bool,
    pub engagement_history: bool,
    pub post_history_older_than_year: bool,

    // Outreach suitability
    pub profile_updates: bool,
    pub shared_interests: bool,
    pub open_to_networking: bool,
    pub industry_relevance: bool,
    pub active_job_titles: bool,

    // Risk signals
    pub newly_created: bool,
    pub sparse_job_history: bool,
    pub default_profile_picture: bool,
    pub low_connections: bool,
    pub no_engagement_on_posts: bool,
}

impl Default for ProfileSignals {
    fn default() -> Self {
        Self {
            connections: None,
            has_verification_shield: false,
            account_type: "normal".to_string(),
            account_age_years: None,
            last_updated: None,
            has_custom_url: false,
            has_profile_summary: false,
            has_professional_photo: true,
            has_old_photo: false,
            outdated_job_info: false,
            missing_about_or_education: false,
            profile_completeness: false,
            skills_endorsements_count: None,
            has_recommendations: false,
            personalized_profile: false,
            recent_activity: true,
            last_post_date: None,
            engagement_with_content: false,
            engagement_history: false,
            post_history_older_than_year: false,
            profile_updates: false,
            shared_interests: false,
            open_to_networking: false,
            industry_relevance: false,
            active_job_titles: false,
            newly_created: false,
            sparse_job_history: false,
            default_profile_picture: false,
            low_connections: false,
            no_engagement_on_posts: false,
        }
    }
}

impl ProfileSignals {
    /// Stored document; anything unreadable falls back to the defaults
    pub fn from_stored(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    /// Applies the keys present in `patch` on top of `self`
    pub fn merged_with(&self, patch: &Map<String, Value>) -> Result<Self, String> {
        let mut current = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        for (key, value) in patch {
            if current.contains_key(key) {
                current.insert(key.clone(), value.clone());
            }
        }
        serde_json::from_value(Value::Object(current)).map_err(|e| e.to_string())
    }
}

// ============================================================================
// Database and Response Models
// ============================================================================

/// Analysis row joined with the submission it belongs to
#[derive(Debug, Clone, FromRow)]
pub struct ProfileAnalysisRow {
    pub id: String,
    pub submission_id: String,
    pub analyzed_by: Option<String>,
    pub signals: String,
    pub summary: String,
    pub score: Option<i64>,
    pub risk_level: String,
    pub created_at: String,
    pub updated_at: String,
    pub submission_email: String,
    pub submission_url: String,
    pub submission_date: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileAnalysisView {
    pub id: String,
    pub submission_id: String,
    pub submission_email: String,
    pub submission_url: String,
    pub submission_date: String,
    pub analyzed_by: Option<String>,
    #[serde(flatten)]
    pub signals: ProfileSignals,
    pub summary: String,
    pub score: Option<i64>,
    pub risk_level: RiskLevel,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ProfileAnalysisRow> for ProfileAnalysisView {
    fn from(row: ProfileAnalysisRow) -> Self {
        Self {
            signals: ProfileSignals::from_stored(&row.signals),
            risk_level: row.risk_level.parse().unwrap_or_default(),
            id: row.id,
            submission_id: row.submission_id,
            submission_email: row.submission_email,
            submission_url: row.submission_url,
            submission_date: row.submission_date,
            analyzed_by: row.analyzed_by,
            summary: row.summary,
            score: row.score,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalysisStatus {
    pub has_analysis: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<String>,
}

#[derive(Debug, Serialize, Default, PartialEq, Eq)]
pub struct RiskDistribution {
    pub low: i64,
    pub medium: i64,
    pub high: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_submissions: i64,
    pub processed_submissions: i64,
    pub pending_submissions: i64,
    pub analyzed_submissions: i64,
    pub risk_distribution: RiskDistribution,
}
