// src/contact/validators.rs

use regex::Regex;
use std::sync::OnceLock;

use super::models::CreateSubmissionRequest;
use crate::common::{ValidationResult, Validator};

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Invalid email pattern")
    })
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

// ============================================================================
// Submission Validators
// ============================================================================

pub struct SubmissionValidator;

impl Validator<CreateSubmissionRequest> for SubmissionValidator {
    fn validate(&self, data: &CreateSubmissionRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        match data.linkedin_url.as_deref().map(str::trim) {
            None | Some("") => result.add_error("linkedin_url", "LinkedIn URL is required."),
            Some(url) if !url.to_lowercase().contains("linkedin.com") => {
                result.add_error("linkedin_url", "Please enter a valid LinkedIn URL.")
            }
            Some(url) if url.len() > 500 => {
                result.add_error("linkedin_url", "LinkedIn URL must be less than 500 characters")
            }
            _ => {}
        }

        // Blank means "use the account email"
        if let Some(email) = data.email.as_deref().map(str::trim) {
            if !email.is_empty() && !is_valid_email(email) {
                result.add_error("email", "Enter a valid email address.");
            }
        }

        if let Some(message) = &data.message {
            if message.len() > 5000 {
                result.add_error("message", "Message must be less than 5000 characters");
            }
        }

        result
    }
}
