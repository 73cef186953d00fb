// src/logging_middleware.rs
//! Middleware for logging request and response bodies in debug mode
//!
//! Secret-bearing fields are redacted before logging, and binary responses
//! (PDF downloads) are passed through untouched.

use axum::body::to_bytes;
use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use tracing::debug;

// Large payloads (full CV content, job descriptions) are truncated in logs
const MAX_LOGGED_BODY: usize = 4096;

const REDACTED_FIELDS: [&str; 3] = ["password", "api_key", "access_token"];

/// Middleware to log request and response bodies in debug mode
pub async fn log_request_response(request: Request, next: Next) -> Result<Response, StatusCode> {
    let (parts, body) = request.into_parts();

    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if !bytes.is_empty() {
        if let Some(logged) = loggable_json(&bytes) {
            debug!(
                method = %parts.method,
                uri = %parts.uri,
                request_body = %logged,
                "Request"
            );
        }
    }

    // Reconstruct request
    let request = Request::from_parts(parts, Body::from(bytes));

    let response = next.run(request).await;

    let (parts, body) = response.into_parts();

    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if !bytes.is_empty() {
        if let Some(logged) = loggable_json(&bytes) {
            debug!(
                status = %parts.status,
                response_body = %logged,
                "Response"
            );
        }
    }

    // Reconstruct response
    let response = Response::from_parts(parts, Body::from(bytes));

    Ok(response)
}

/// Parse a body as JSON, redact secret fields, and truncate; None for
/// non-JSON bodies
fn loggable_json(bytes: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(bytes).ok()?;
    let mut json: Value = serde_json::from_str(text).ok()?;
    redact_secrets(&mut json);

    let mut rendered = json.to_string();
    if rendered.len() > MAX_LOGGED_BODY {
        rendered.truncate(MAX_LOGGED_BODY);
        rendered.push_str("...<truncated>");
    }
    Some(rendered)
}

fn redact_secrets(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if REDACTED_FIELDS.contains(&key.as_str()) && child.is_string() {
                    *child = Value::String("<redacted>".to_string());
                } else {
                    redact_secrets(child);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                redact_secrets(item);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_secret_fields_are_redacted() {
        let mut value = json!({
            "email": "a@b.com",
            "password": "hunter22!",
            "nested": {"api_key": "gsk-secret"}
        });

        redact_secrets(&mut value);

        assert_eq!(value["email"], "a@b.com");
        assert_eq!(value["password"], "<redacted>");
        assert_eq!(value["nested"]["api_key"], "<redacted>");
    }

    #[test]
    fn test_non_json_bodies_are_not_logged() {
        assert!(loggable_json(b"%PDF-1.7 binary bytes").is_none());
        assert!(loggable_json(&[0xff, 0xfe, 0x00]).is_none());
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = serde_json::to_vec(&json!({"text": "x".repeat(10000)})).unwrap();
        let logged = loggable_json(&body).unwrap();
        assert!(logged.ends_with("...<truncated>"));
        assert!(logged.len() <= MAX_LOGGED_BODY + 20);
    }
}
