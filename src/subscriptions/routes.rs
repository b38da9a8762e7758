// src/subscriptions/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

pub fn subscription_routes() -> Router {
    Router::new()
        .route(
            "/api/admin/subscriptions",
            post(handlers::assign_subscription),
        )
        .route("/api/admin/users", get(handlers::list_users))
}
