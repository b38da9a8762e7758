//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /api/auth/login` - Email/password login
/// - `POST /api/auth/signup` - Account creation
/// - `POST /api/auth/refresh` - New access token from a refresh token
/// - `POST /api/auth/google` and `POST /auth/google` - Google sign-in
/// - `POST /api/auth/verify-email`, `POST /api/auth/resend-verification`
/// - `POST /api/auth/password-reset`, `POST /api/auth/password-reset/:uid/:token`
/// - `GET /api/auth/profile` - Current user
/// - `POST /api/auth/logout` - Logout (client-side token removal)
pub fn auth_routes() -> Router {
    Router::new()
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/signup", post(handlers::signup))
        .route("/api/auth/refresh", post(handlers::refresh))
        .route("/api/auth/google", post(handlers::google_auth))
        .route("/auth/google", post(handlers::google_auth))
        .route("/api/auth/verify-email", post(handlers::verify_email))
        .route(
            "/api/auth/resend-verification",
            post(handlers::resend_verification),
        )
        .route("/api/auth/password-reset", post(handlers::password_reset))
        .route(
            "/api/auth/password-reset/:uid/:token",
            post(handlers::password_reset_confirm),
        )
        .route("/api/auth/profile", get(handlers::profile))
        .route("/api/auth/logout", post(handlers::logout))
}
