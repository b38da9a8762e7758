// src/logging_middleware.rs
//! Middleware for logging request and response bodies in debug mode
//!
//! Credentials and tokens are replaced with `[REDACTED]` before anything
//! reaches the log.

use axum::body::to_bytes;
use axum::{body::Body, extract::Request, http::StatusCode, middleware::Next, response::Response};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::{debug, enabled, Level};

const REDACTED: &str = "[REDACTED]";

/// Keys whose values never appear in logs
const SENSITIVE_KEYS: [&str; 7] = [
    "password",
    "password2",
    "token",
    "credential",
    "refresh",
    "access",
    "reset_url",
];

fn form_field_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(password2?|token|credential|refresh|access)=[^&\s]*")
            .expect("Invalid redaction pattern")
    })
}

/// Masks sensitive values anywhere in a JSON document
pub fn redact_json(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                if SENSITIVE_KEYS.contains(&key.to_lowercase().as_str()) {
                    *v = Value::String(REDACTED.to_string());
                } else {
                    redact_json(v);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_json),
        _ => {}
    }
}

/// Masks `key=value` pairs in form-encoded or plain text bodies
pub fn redact_text(body: &str) -> String {
    form_field_pattern()
        .replace_all(body, |caps: &regex::Captures| format!("{}={}", &caps[1], REDACTED))
        .into_owned()
}

fn render_body(body_str: &str) -> String {
    match serde_json::from_str::<Value>(body_str) {
        Ok(mut json) => {
            redact_json(&mut json);
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| redact_text(body_str))
        }
        Err(_) => redact_text(body_str),
    }
}

/// Middleware to log request and response bodies in debug mode
pub async fn log_request_response(request: Request, next: Next) -> Result<Response, StatusCode> {
    if !enabled!(Level::DEBUG) {
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();

    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if !bytes.is_empty() {
        if let Ok(body_str) = std::str::from_utf8(&bytes) {
            debug!(
                method = %parts.method,
                uri = %parts.uri.path(),
                request_body = %render_body(body_str),
                "📥 Request"
            );
        }
    }

    let request = Request::from_parts(parts, Body::from(bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if !bytes.is_empty() {
        if let Ok(body_str) = std::str::from_utf8(&bytes) {
            debug!(
                status = %parts.status,
                response_body = %render_body(body_str),
                "📤 Response"
            );
        }
    }

    Ok(Response::from_parts(parts, Body::from(bytes)))
}
