// src/analysis/mod.rs
//! Structured reviewer analyses of submitted profiles

pub mod handlers;
pub mod models;
pub mod routes;
pub mod validators;

#[cfg(test)]
mod tests;

pub use routes::analysis_routes;
