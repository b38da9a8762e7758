// src/subscriptions/mod.rs
//! User subscription tiers and the submission quota they grant

pub mod handlers;
pub mod models;
pub mod routes;


pub use routes::subscription_routes;
