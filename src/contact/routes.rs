// src/contact/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use crate::contact::handlers;

pub fn contact_routes() -> Router {
    Router::new()
        // User routes
        .route("/api/contact/submit", post(handlers::user::submit))
        .route(
            "/api/contact/user-submissions",
            get(handlers::user::list_own_submissions),
        )
        .route(
            "/api/contact/user-submissions/:id",
            get(handlers::user::get_own_submission),
        )
        // Admin routes
        .route(
            "/api/admin/submissions",
            get(handlers::admin::list_submissions),
        )
        .route(
            "/api/admin/submissions/:id",
            get(handlers::admin::get_submission).patch(handlers::admin::update_submission),
        )
        .route(
            "/api/admin/submissions/:id/reply",
            post(handlers::admin::reply_to_submission),
        )
        .route("/api/admin/processed", get(handlers::admin::list_processed))
        .route(
            "/api/admin/processed/:id",
            get(handlers::admin::get_processed),
        )
        .route("/api/admin/stats", get(handlers::admin::submission_stats))
}
