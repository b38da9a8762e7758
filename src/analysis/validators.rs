// src/analysis/validators.rs

use serde_json::{Map, Value};

use super::models::{ProfileSignals, RiskLevel, MAX_SCORE};
use crate::common::{ValidationResult, Validator};

/// The writable part of an analysis
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalysisInput {
    pub signals: ProfileSignals,
    pub summary: String,
    pub score: Option<i64>,
    pub risk_level: RiskLevel,
}

impl AnalysisInput {
    /// Overlays the keys present in `body` onto `self`. Absent keys keep
    /// their current value, which makes the same code serve create (from
    /// defaults) and partial update (from the stored analysis).
    pub fn apply(&self, body: &Map<String, Value>) -> Result<Self, ValidationResult> {
        let result = AnalysisBodyValidator.validate(body);
        if !result.is_valid {
            return Err(result);
        }

        let mut next = self.clone();

        match self.signals.merged_with(body) {
            Ok(signals) => next.signals = signals,
            Err(message) => {
                let mut result = ValidationResult::new();
                result.add_error("signals", &message);
                return Err(result);
            }
        }

        if let Some(summary) = body.get("summary") {
            next.summary = summary.as_str().unwrap_or_default().to_string();
        }
        if let Some(score) = body.get("score") {
            next.score = parse_score(score).ok().flatten();
        }
        if let Some(risk) = body.get("risk_level").and_then(Value::as_str) {
            next.risk_level = risk.parse().unwrap_or_default();
        }

        Ok(next)
    }
}

fn parse_score(value: &Value) -> Result<Option<i64>, &'static str> {
    let score = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_i64().ok_or("A valid integer is required.")?,
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| "A valid integer is required.")?,
        _ => return Err("A valid integer is required."),
    };

    if score < 0 {
        Err("Ensure this value is greater than or equal to 0.")
    } else if score > MAX_SCORE {
        Err("Ensure this value is less than or equal to 100.")
    } else {
        Ok(Some(score))
    }
}

// ============================================================================
// Analysis Validators
// ============================================================================

pub struct AnalysisBodyValidator;

impl Validator<Map<String, Value>> for AnalysisBodyValidator {
    fn validate(&self, data: &Map<String, Value>) -> ValidationResult {
        let mut result = ValidationResult::new();

        if let Some(score) = data.get("score") {
            if let Err(message) = parse_score(score) {
                result.add_error("score", message);
            }
        }

        if let Some(risk) = data.get("risk_level") {
            match risk.as_str() {
                Some(level) => {
                    if let Err(message) = level.parse::<RiskLevel>() {
                        result.add_error("risk_level", &message);
                    }
                }
                None => result.add_error("risk_level", "Not a valid string."),
            }
        }

        if let Some(summary) = data.get("summary") {
            if !summary.is_string() && !summary.is_null() {
                result.add_error("summary", "Not a valid string.");
            }
        }

        if let Some(account_type) = data.get("account_type").and_then(Value::as_str) {
            if account_type.chars().count() > 20 {
                result.add_error(
                    "account_type",
                    "Ensure this field has no more than 20 characters.",
                );
            }
        }

        result
    }
}
