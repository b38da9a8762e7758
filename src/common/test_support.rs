// src/common/test_support.rs
//! In-memory database, app state and request helpers for module tests

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use reqwest::Client;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceExt;

use super::config::AppConfig;
use super::migrations::run_migrations;
use super::state::AppState;
use crate::auth::models::Role;
use crate::auth::password::hash_password;
use crate::auth::tokens::{issue_login_tokens, HARDCODED_ADMIN_ID};
use crate::common::{generate_user_id, now_timestamp};
use crate::services::{EmailService, OutgoingEmail};

pub const ADMIN_EMAIL: &str = "owner@example.com";
pub const ADMIN_PASSWORD: &str = "owner-secret-pass";
pub const TEST_PASSWORD: &str = "correct-horse-9";

/// A single connection keeps every query on the same in-memory database
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    run_migrations(&pool, false).await.unwrap();
    pool
}

pub fn test_config() -> AppConfig {
    AppConfig::from_lookup(|key| match key {
        "JWT_SECRET" => Some("test_secret_key".to_string()),
        "ADMIN_EMAIL" => Some(ADMIN_EMAIL.to_string()),
        "ADMIN_PASSWORD" => Some(ADMIN_PASSWORD.to_string()),
        "ADMIN_EMAILS" => Some("staff@example.com".to_string()),
        "EMAIL_BACKEND" => Some("memory".to_string()),
        "FRONTEND_URL" => Some("http://frontend.test/".to_string()),
        _ => None,
    })
    .unwrap()
}

pub async fn test_state() -> AppState {
    let config = test_config();
    let email_service =
        EmailService::from_config(&config.email_backend, &config.default_from_email).unwrap();
    AppState {
        db: memory_pool().await,
        http: Client::new(),
        config: Arc::new(config),
        email_service: Arc::new(email_service),
    }
}

pub fn router(state: &AppState) -> Router {
    let shared = Arc::new(RwLock::new(state.clone()));
    crate::app::build_router(shared, &state.config.cors_origins)
}

/// Sends one request and returns the status with the parsed JSON body
/// (`Value::Null` for an empty body).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send_request(app, request).await
}

/// Runs a prepared request through the router
pub async fn send_request(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Inserts a user with `TEST_PASSWORD` and returns its id
pub async fn insert_user(pool: &SqlitePool, email: &str, role: Role) -> String {
    let id = generate_user_id();
    let now = now_timestamp();
    sqlx::query(
        "INSERT INTO users (id, email, password_hash, role, is_staff, email_verified, created_at, updated_at)
         VALUES (?, ?, ?, ?, 0, 1, ?, ?)",
    )
    .bind(&id)
    .bind(email)
    .bind(hash_password(TEST_PASSWORD).unwrap())
    .bind(role.as_str())
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .unwrap();
    id
}

pub fn access_token(state: &AppState, user_id: &str, email: &str, role: Role) -> String {
    issue_login_tokens(&state.config, user_id, email, role)
        .unwrap()
        .0
}

pub fn admin_token(state: &AppState) -> String {
    access_token(state, HARDCODED_ADMIN_ID, ADMIN_EMAIL, Role::Admin)
}

/// Points the state at a local tokeninfo endpoint that answers every
/// credential with `payload`.
pub async fn with_tokeninfo(state: &AppState, payload: Value) -> AppState {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let stub = Router::new().route(
        "/tokeninfo",
        axum::routing::get(move || {
            let payload = payload.clone();
            async move { axum::Json(payload) }
        }),
    );
    tokio::spawn(async move {
        let _ = axum::serve(listener, stub.into_make_service()).await;
    });

    let mut config = (*state.config).clone();
    config.google_tokeninfo_url = format!("http://{}/tokeninfo", addr);
    AppState {
        config: Arc::new(config),
        http: Client::builder().no_proxy().build().unwrap(),
        ..state.clone()
    }
}

/// Waits for background email tasks to land in the memory outbox
pub async fn wait_for_outbox(state: &AppState, expected: usize) -> Vec<OutgoingEmail> {
    for _ in 0..100 {
        let outbox = state.email_service.outbox();
        if outbox.len() >= expected {
            return outbox;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    state.email_service.outbox()
}

/// Gives spawned tasks a chance to run before asserting nothing was sent
pub async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
}
