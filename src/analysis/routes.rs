// src/analysis/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

pub fn analysis_routes() -> Router {
    Router::new()
        .route("/api/admin/analyses", post(handlers::create_analysis))
        .route(
            "/api/admin/analyses/:id",
            get(handlers::get_analysis)
                .put(handlers::update_analysis)
                .delete(handlers::delete_analysis),
        )
        .route(
            "/api/admin/submissions/:id/analysis-status",
            get(handlers::analysis_status),
        )
        .route("/api/admin/dashboard/stats", get(handlers::dashboard_stats))
}
