// src/common/id_generator.rs
//! Crockford Base32 ID Generator
//!
//! Generates human-readable, prefixed IDs using Crockford Base32 encoding.
//! Format: PREFIX_XXXXXX (e.g., S_K7NP3X for submissions)
//!
//! The alphabet excludes I, L, O and U so IDs can be read back over the
//! phone or copied from an email without ambiguity.

use rand::Rng;

/// Crockford Base32 alphabet (excludes I, L, O, U to avoid confusion)
const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Entity type prefixes for ID generation
#[derive(Debug, Clone, Copy)]
pub enum EntityPrefix {
    /// User account (U_)
    User,
    /// LinkedIn profile submission (S_)
    Submission,
    /// Profile analysis (A_)
    Analysis,
    /// Subscription tier assignment (T_)
    Subscription,
}

impl EntityPrefix {
    /// Get the string prefix for this entity type
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::User => "U",
            EntityPrefix::Submission => "S",
            EntityPrefix::Analysis => "A",
            EntityPrefix::Subscription => "T",
        }
    }
}

/// Generate a random Crockford Base32 string of specified length
fn generate_crockford_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..32);
            CROCKFORD_ALPHABET[idx] as char
        })
        .collect()
}

/// Generate a prefixed ID using Crockford Base32 encoding
///
/// Returns a string in format "PREFIX_XXXXXXXX" (e.g., "U_K7NP3XQ2")
pub fn generate_id(prefix: EntityPrefix) -> String {
    format!("{}_{}", prefix.as_str(), generate_crockford_string(8))
}

pub fn generate_user_id() -> String {
    generate_id(EntityPrefix::User)
}

pub fn generate_submission_id() -> String {
    generate_id(EntityPrefix::Submission)
}

pub fn generate_analysis_id() -> String {
    generate_id(EntityPrefix::Analysis)
}

pub fn generate_subscription_id() -> String {
    generate_id(EntityPrefix::Subscription)
}
