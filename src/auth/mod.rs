//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - Email/password and Google sign-in
//! - JWT issuance for access, refresh, verification and reset tokens
//! - The `Principal` / `AdminPrincipal` extractors guarding every protected route

pub mod extractors;
pub mod google;
pub mod handlers;
pub mod models;
pub mod password;
pub mod routes;
pub mod tokens;

#[cfg(test)]
mod tests;

pub use extractors::{AdminPrincipal, Principal};
pub use models::{Role, User};
pub use routes::auth_routes;
