// src/services/mod.rs
//
// Shared services module containing infrastructure used across
// the domain modules

pub mod email;
pub mod mailer;

// Re-export commonly used types for convenience
pub use mailer::{EmailService, OutgoingEmail};
