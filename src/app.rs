// src/app.rs
//! Router composition shared by the server binary and the HTTP tests

use axum::{
    extract::Extension,
    http::{header, HeaderName, HeaderValue, Method},
    middleware, Router,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::common::AppState;
use crate::{analysis, auth, contact, logging_middleware, subscriptions};

pub fn build_router(shared: Arc<RwLock<AppState>>, cors_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("admin-authorization"),
            HeaderName::from_static("x-request-id"),
        ])
        .allow_credentials(true);

    Router::new()
        // ====================================================================
        // AUTHENTICATION ROUTES
        // ====================================================================
        .merge(auth::auth_routes())
        // ====================================================================
        // CONTACT ROUTES (User submissions and admin workflow)
        // ====================================================================
        .merge(contact::contact_routes())
        // ====================================================================
        // ADMIN ROUTES (Analyses, Subscriptions, Users)
        // ====================================================================
        .merge(analysis::analysis_routes())
        .merge(subscriptions::subscription_routes())
        // ====================================================================
        // MIDDLEWARE AND LAYERS
        // ====================================================================
        .layer(middleware::from_fn(logging_middleware::log_request_response))
        .layer(Extension(shared))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
