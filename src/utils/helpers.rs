//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the bridge.

use chrono::Utc;
use uuid::Uuid;

/// Generate a new UUID v4
pub fn generate_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Current Unix time in whole seconds
pub fn now_epoch_seconds() -> i64 {
    Utc::now().timestamp()
}

/// Epoch second `ttl_seconds` after `now`; `None` when it does not fit in an `i64`
pub fn expiry_after(now: i64, ttl_seconds: u64) -> Option<i64> {
    i64::try_from(ttl_seconds).ok().and_then(|ttl| now.checked_add(ttl))
}

/// Truncate text to a maximum number of characters with ellipsis
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Percent-encode path segments that contain non-ASCII characters.
///
/// Segments that are already percent-encoded are decoded first and only
/// re-encoded when they decode to non-ASCII text. Strings that do not parse
/// as URLs are returned unchanged.
pub fn encode_url_path(raw: &str) -> String {
    let mut url = match url::Url::parse(raw) {
        Ok(url) => url,
        Err(_) => return raw.to_string(),
    };

    if url.cannot_be_a_base() {
        return raw.to_string();
    }

    let segments: Vec<String> = url
        .path()
        .split('/')
        .map(|part| {
            if part.is_empty() {
                return part.to_string();
            }
            match urlencoding::decode(part) {
                Ok(decoded) if !decoded.is_ascii() => urlencoding::encode(&decoded).into_owned(),
                _ => part.to_string(),
            }
        })
        .collect();

    url.set_path(&segments.join("/"));
    url.to_string()
}

/// Whether a string looks like an absolute http(s) URL
pub fn is_http_url(raw: &str) -> bool {
    url::Url::parse(raw)
        .map(|u| u.scheme() == "http" || u.scheme() == "https")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_after() {
        assert_eq!(expiry_after(1_000, 60), Some(1_060));
        assert_eq!(expiry_after(1_000, i64::MAX as u64), None);
        assert_eq!(expiry_after(1_000, u64::MAX), None);
        assert_eq!(expiry_after(0, i64::MAX as u64), Some(i64::MAX));
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 8), "hello...");
        assert_eq!(truncate_text("привет мир", 7), "прив...");
    }

    #[test]
    fn test_encode_url_path_keeps_ascii() {
        assert_eq!(
            encode_url_path("https://example.com/images/cat.png"),
            "https://example.com/images/cat.png"
        );
        assert_eq!(encode_url_path("not a url"), "not a url");
    }

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("https://example.com"));
        assert!(!is_http_url("buy"));
        assert!(!is_http_url("ftp://example.com"));
    }
}
