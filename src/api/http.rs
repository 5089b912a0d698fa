//! Shared HTTP client and error mapping for relay and service calls.

use std::sync::OnceLock;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ErrorDetails, SheafError};

/// Explicit ceiling on every relay and service round-trip. A silent
/// network failure must surface as a timeout, not a hung caller.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const BODY_SNIPPET_LEN: usize = 300;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to build HTTP client")
    })
}

/// Error body shape the relay functions answer with.
#[derive(Debug, Deserialize)]
struct RelayErrorBody {
    error: Option<String>,
    details: Option<String>,
}

/// Pull the relay's `{error, details?}` fields out of an error body.
pub fn parse_error_body(body: &str) -> ErrorDetails {
    let parsed: Option<RelayErrorBody> = serde_json::from_str(body).ok();
    match parsed {
        Some(parsed) => ErrorDetails {
            code: None,
            service_code: parsed.error,
            detail: parsed.details,
        },
        None => ErrorDetails {
            code: None,
            service_code: None,
            detail: None,
        },
    }
}

/// Human-oriented summary of an error body: `details` when present,
/// else `error`, else a snippet of the raw body.
pub fn error_detail(body: &str) -> String {
    let details = parse_error_body(body);
    if let Some(detail) = details.detail {
        return detail;
    }
    if let Some(code) = details.service_code {
        return code;
    }
    snippet(body)
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= BODY_SNIPPET_LEN {
        trimmed.to_string()
    } else {
        let mut end = BODY_SNIPPET_LEN;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &trimmed[..end])
    }
}

/// Map an HTTP error status to a crate error.
pub fn status_to_error(status: u16, body: &str) -> SheafError {
    match status {
        401 | 403 => SheafError::Authentication(error_detail(body)),
        429 => SheafError::RateLimited {
            retry_after_ms: None,
        },
        _ => SheafError::api_with_details(status, error_detail(body), parse_error_body(body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_maps_to_authentication() {
        let err = status_to_error(401, r#"{"error":"Missing Authorization header"}"#);
        assert!(matches!(err, SheafError::Authentication(_)));
    }

    #[test]
    fn server_error_carries_relay_details() {
        let err = status_to_error(
            500,
            r#"{"error":"Token exchange failed","details":"invalid_grant"}"#,
        );
        match err {
            SheafError::Api {
                status,
                message,
                details,
                ..
            } => {
                assert_eq!(status, 500);
                assert_eq!(message, "invalid_grant");
                let details = details.unwrap();
                assert_eq!(details.service_code.as_deref(), Some("Token exchange failed"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn error_detail_prefers_details_then_error() {
        assert_eq!(
            error_detail(r#"{"error":"broad","details":"narrow"}"#),
            "narrow"
        );
        assert_eq!(error_detail(r#"{"error":"broad"}"#), "broad");
        assert_eq!(error_detail("plain text"), "plain text");
    }

    #[test]
    fn snippet_truncates_long_bodies() {
        let long = "x".repeat(1000);
        let detail = error_detail(&long);
        assert!(detail.len() < 1000);
        assert!(detail.ends_with("..."));
    }

}
