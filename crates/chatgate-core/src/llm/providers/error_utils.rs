//! Provider error sanitization helpers

use crate::error::GatewayError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const MAX_ERROR_TEXT_CHARS: usize = 1_024;
const REDACTED: &str = "[REDACTED]";

static BEARER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bBearer\s+[A-Za-z0-9._\-+/=]{8,}").expect("valid bearer regex")
});

static SECRET_PAIR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b(api[_-]?key|x-api-key|access[_-]?token|token|secret|password|authorization)\b\s*[:=]\s*["']?[^"',\s}]+"#,
    )
    .expect("valid secret pair regex")
});

/// Redact secrets and cap the length of an error body
///
/// JSON bodies lose sensitive fields and have inline secrets in string
/// values masked; anything else is masked as plain text.
pub fn sanitize_provider_error_text(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "<empty error response body>".to_string();
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(mut json) => {
            redact_json_value(&mut json);
            truncate(json.to_string())
        }
        Err(_) => truncate(redact_inline(trimmed)),
    }
}

fn redact_json_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if is_sensitive_key(key) {
                    *val = Value::String(REDACTED.to_string());
                } else {
                    redact_json_value(val);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_json_value),
        Value::String(text) => *text = redact_inline(text),
        _ => {}
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.to_ascii_lowercase().replace(['-', ' '], "_");
    ["api_key", "token", "secret", "password", "authorization", "cookie"]
        .iter()
        .any(|needle| normalized.contains(needle))
}

fn redact_inline(text: &str) -> String {
    let masked = BEARER_RE.replace_all(text, "Bearer [REDACTED]");
    SECRET_PAIR_RE
        .replace_all(&masked, "$1=[REDACTED]")
        .into_owned()
}

fn truncate(text: String) -> String {
    if text.chars().count() <= MAX_ERROR_TEXT_CHARS {
        return text;
    }
    let cut: String = text.chars().take(MAX_ERROR_TEXT_CHARS).collect();
    format!("{}... [truncated]", cut)
}

/// Turn a non-success response into an `Http` error, logging the body
pub async fn handle_http_error(response: reqwest::Response, provider: &str) -> GatewayError {
    let status = response.status();
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    let body = sanitize_provider_error_text(&body);

    tracing::error!(
        provider,
        status = status.as_u16(),
        url = %url,
        body = %body,
        "Provider request failed"
    );

    GatewayError::Http {
        message: format!("{} returned {}: {}", provider, status, body),
        url: Some(url),
        status_code: Some(status.as_u16()),
    }
}
