// src/subscriptions/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Rolling window the submission quota is counted over
pub const QUOTA_WINDOW_DAYS: i64 = 30;

/// Days granted when an assignment does not say otherwise
pub const DEFAULT_VALID_FOR_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Free,
    Basic,
    Premium,
    PremiumElite,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Free, Tier::Basic, Tier::Premium, Tier::PremiumElite];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Basic => "basic",
            Tier::Premium => "premium",
            Tier::PremiumElite => "premium_elite",
        }
    }

    /// Submissions allowed per quota window, `None` for unlimited
    pub fn submission_quota(&self) -> Option<i64> {
        match self {
            Tier::Free => Some(1),
            Tier::Basic => Some(5),
            Tier::Premium => Some(20),
            Tier::PremiumElite => None,
        }
    }

    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(Tier::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .into_iter()
            .find(|tier| tier.as_str() == s)
            .ok_or_else(|| format!("Invalid tier. Must be one of: {}", Tier::valid_names()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSubscription {
    pub id: String,
    pub user_id: String,
    pub tier: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub notes: Option<String>,
    pub assigned_by: Option<String>,
    pub updated_at: String,
}

impl UserSubscription {
    /// Stored tier; unknown values degrade to free
    pub fn tier(&self) -> Tier {
        self.tier.parse().unwrap_or(Tier::Free)
    }

    /// Free subscriptions never lapse; paid ones are active until `end_date`
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        if self.tier() == Tier::Free {
            return true;
        }
        match self.end_date.as_deref() {
            None => true,
            Some(end) => DateTime::parse_from_rfc3339(end)
                .map(|end| end.with_timezone(&Utc) > now)
                .unwrap_or(false),
        }
    }

    pub fn effective_tier_at(&self, now: DateTime<Utc>) -> Tier {
        if self.is_active_at(now) {
            self.tier()
        } else {
            Tier::Free
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignSubscriptionRequest {
    pub email: Option<String>,
    pub tier: Option<String>,
    /// Accepts numbers and numeric strings; anything else means the default
    pub valid_for_days: Option<serde_json::Value>,
    pub notes: Option<String>,
}

impl AssignSubscriptionRequest {
    /// Missing, zero or unparsable values fall back to the default window
    pub fn valid_for_days(&self) -> i64 {
        let parsed = match &self.valid_for_days {
            Some(serde_json::Value::Number(n)) => n.as_i64(),
            Some(serde_json::Value::String(s)) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        match parsed {
            Some(0) | None => DEFAULT_VALID_FOR_DAYS,
            Some(days) => days,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AssignSubscriptionResponse {
    pub message: String,
    pub tier: Tier,
    pub end_date: Option<String>,
    pub is_active: bool,
    pub created: bool,
}

/// Row for the admin user listing
#[derive(Debug, FromRow)]
pub struct UserWithSubscriptionRow {
    pub id: String,
    pub email: String,
    pub role: String,
    pub is_staff: bool,
    pub email_verified: bool,
    pub created_at: String,
    pub sub_id: Option<String>,
    pub tier: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub notes: Option<String>,
    pub assigned_by: Option<String>,
    pub sub_updated_at: Option<String>,
}

impl UserWithSubscriptionRow {
    pub fn subscription(&self) -> Option<UserSubscription> {
        Some(UserSubscription {
            id: self.sub_id.clone()?,
            user_id: self.id.clone(),
            tier: self.tier.clone()?,
            start_date: self.start_date.clone().unwrap_or_default(),
            end_date: self.end_date.clone(),
            notes: self.notes.clone(),
            assigned_by: self.assigned_by.clone(),
            updated_at: self.sub_updated_at.clone().unwrap_or_default(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct AdminUserView {
    pub id: String,
    pub email: String,
    pub role: String,
    pub is_staff: bool,
    pub email_verified: bool,
    pub date_joined: String,
    pub tier: Tier,
    pub subscription_active: bool,
    pub subscription_end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminUserList {
    pub users: Vec<AdminUserView>,
    pub total_count: i64,
    pub total_pages: i64,
    pub current_page: i64,
}

/// Subscription summary embedded in the user's own profile
#[derive(Debug, Serialize)]
pub struct SubscriptionSummary {
    pub tier: Tier,
    pub is_active: bool,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub submission_quota: Option<i64>,
}

impl SubscriptionSummary {
    pub fn from_subscription(sub: Option<&UserSubscription>, now: DateTime<Utc>) -> Self {
        match sub {
            Some(sub) => {
                let tier = sub.effective_tier_at(now);
                Self {
                    tier,
                    is_active: sub.is_active_at(now),
                    start_date: Some(sub.start_date.clone()),
                    end_date: sub.end_date.clone(),
                    submission_quota: tier.submission_quota(),
                }
            }
            None => Self {
                tier: Tier::Free,
                is_active: true,
                start_date: None,
                end_date: None,
                submission_quota: Tier::Free.submission_quota(),
            },
        }
    }
}
