//! Redaction of credentials before anything reaches the logs.
use std::sync::OnceLock;

use http::{HeaderMap, HeaderValue};
use regex::Regex;
use serde_json::Value;

static REGEX: OnceLock<Regex> = OnceLock::new();

pub static SANITIZED_VALUE: &str = "**********";

fn regex() -> &'static Regex {
    REGEX.get_or_init(|| {
        let s = ["secret", "key", "session", "password", "token"]
            .map(|s| format!(r#"(\b|[-_]){s}(\b|[-_])"#))
            .join("|");

        Regex::new(&format!(r#"(?i)({s})"#)).expect("Unable to compile regex")
    })
}

pub fn should_sanitize(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    match key.as_str() {
        "authorization" | "cookie" | "set-cookie" | "password" | "username" => true,
        _ => regex().is_match(&key),
    }
}

pub fn sanitize_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, value) in map.iter_mut() {
                if should_sanitize(key) {
                    *value = Value::String(SANITIZED_VALUE.to_string());
                } else {
                    sanitize_value(value);
                }
            }
        }
        Value::Array(vec) => {
            for value in vec.iter_mut() {
                sanitize_value(value);
            }
        }
        _ => {}
    }
}

/// Copy of `headers` with credential values masked, suitable for logging.
pub fn sanitized_headers(headers: &HeaderMap) -> HeaderMap {
    let masked = HeaderValue::from_static(SANITIZED_VALUE);
    let mut headers = headers.clone();
    for (key, value) in headers.iter_mut() {
        if should_sanitize(key.as_str()) {
            *value = masked.clone();
        }
    }
    headers
}

/// Query parameters are masked the same way as JSON keys, so the refresh token in
/// `?refresh_token=...` never shows up in a log line.
pub fn sanitize_query(uri: &http::Uri) -> String {
    let Some(query) = uri.query() else {
        return uri.to_string();
    };
    let masked = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((k, _)) if should_sanitize(k) => format!("{k}={SANITIZED_VALUE}"),
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&");
    let full = uri.to_string();
    match full.split_once('?') {
        Some((base, _)) => format!("{base}?{masked}"),
        None => full,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_should_sanitize() {
        assert!(should_sanitize("Authorization"));
        assert!(should_sanitize("refresh_token"));
        assert!(should_sanitize("x-api-key"));
        assert!(!should_sanitize("title"));
        assert!(!should_sanitize("keyboard"));
    }

    #[test]
    fn test_sanitize_nested() {
        let mut value = json!({"user": {"email": "a@b.c", "password": "hunter2"}, "items": [{"token": "t"}]});
        sanitize_value(&mut value);
        assert_eq!(value, json!({"user": {"email": "a@b.c", "password": SANITIZED_VALUE}, "items": [{"token": SANITIZED_VALUE}]}));
    }

    #[test]
    fn test_sanitized_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::AUTHORIZATION, "Bearer A1".parse().unwrap());
        headers.insert(http::header::ACCEPT, "application/json".parse().unwrap());
        let headers = sanitized_headers(&headers);
        assert_eq!(headers[http::header::AUTHORIZATION], SANITIZED_VALUE);
        assert_eq!(headers[http::header::ACCEPT], "application/json");
    }

    #[test]
    fn test_sanitize_query() {
        let uri: http::Uri = "http://localhost/api/v1/auth/refresh?refresh_token=R1&x=1".parse().unwrap();
        assert_eq!(sanitize_query(&uri), "http://localhost/api/v1/auth/refresh?refresh_token=**********&x=1");
    }
}
