//! HTTP failure classification
//!
//! Maps non-2xx responses onto the crate error taxonomy. Provider-agnostic:
//! the OpenAI error envelope is probed for a message, with a clipped body
//! excerpt as the fallback.

use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::error::GenError;
use crate::utils::excerpt;

/// Classify a non-2xx response into a [`GenError`].
///
/// `401`/`403` map to authentication failures, `404` to not-found, `429` to
/// a rate limit carrying the parsed `Retry-After` hint, the remaining `4xx`
/// to an invalid request, and everything else to a provider error (which the
/// retry layer treats as transient when the status is `5xx`).
pub fn classify_http_error(
    provider_id: &str,
    status: u16,
    headers: &HeaderMap,
    body: &str,
) -> GenError {
    let reason = reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("http error");
    let message = error_message(body, reason);

    match status {
        401 | 403 => {
            GenError::AuthenticationError(format!("provider={} {}", provider_id, message))
        }
        404 => GenError::NotFound(format!("provider={} {}", provider_id, message)),
        429 => GenError::RateLimitError {
            message: format!("provider={} {}", provider_id, message),
            retry_after: parse_retry_after(headers),
        },
        400..=499 => GenError::InvalidRequest { status, message },
        _ => {
            let body_sample = (!body.trim().is_empty()).then(|| excerpt(body));
            GenError::provider_error(provider_id, status, message, body_sample)
        }
    }
}

/// Pull the human-readable message out of an OpenAI-style error envelope,
/// `{"error": {"message": "..."}}`, falling back to a body excerpt.
fn error_message(body: &str, fallback: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body)
        && let Some(message) = value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        && !message.is_empty()
    {
        return message.to_string();
    }
    let clipped = excerpt(body);
    if clipped.trim().is_empty() {
        fallback.to_string()
    } else {
        clipped
    }
}

/// Parse a `Retry-After` header, accepting both delta-seconds and HTTP-date
/// forms. Dates already in the past yield `None`.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get("retry-after")?.to_str().ok()?.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let when = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    when.signed_duration_since(chrono::Utc::now()).to_std().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers_with(name: &'static str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn unauthorized_maps_to_authentication() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        let error = classify_http_error("openai", 401, &HeaderMap::new(), body);

        match error {
            GenError::AuthenticationError(message) => {
                assert!(message.contains("Incorrect API key provided"));
                assert!(message.contains("provider=openai"));
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn forbidden_maps_to_authentication() {
        let error = classify_http_error("openai", 403, &HeaderMap::new(), "");
        assert!(matches!(error, GenError::AuthenticationError(_)));
    }

    #[test]
    fn missing_resource_maps_to_not_found() {
        let body = r#"{"error": {"message": "The model `sora-3` does not exist"}}"#;
        let error = classify_http_error("openai", 404, &HeaderMap::new(), body);

        match error {
            GenError::NotFound(message) => assert!(message.contains("sora-3")),
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn rate_limit_parses_delta_seconds() {
        let headers = headers_with("retry-after", "7");
        let error = classify_http_error("openai", 429, &headers, "");

        match error {
            GenError::RateLimitError { retry_after, .. } => {
                assert_eq!(retry_after, Some(Duration::from_secs(7)));
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn rate_limit_parses_http_date() {
        let when = chrono::Utc::now() + chrono::Duration::seconds(60);
        let headers = headers_with("retry-after", &when.to_rfc2822());
        let error = classify_http_error("openai", 429, &headers, "");

        match error {
            GenError::RateLimitError {
                retry_after: Some(hint),
                ..
            } => {
                assert!(hint <= Duration::from_secs(60));
                assert!(hint >= Duration::from_secs(55));
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn rate_limit_without_header_has_no_hint() {
        let error = classify_http_error("openai", 429, &HeaderMap::new(), "");
        assert!(matches!(
            error,
            GenError::RateLimitError {
                retry_after: None,
                ..
            }
        ));
    }

    #[test]
    fn other_client_errors_map_to_invalid_request() {
        let error = classify_http_error("openai", 422, &HeaderMap::new(), "unprocessable");
        match error {
            GenError::InvalidRequest { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "unprocessable");
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn server_errors_become_retryable_provider_errors() {
        let error = classify_http_error("openai", 503, &HeaderMap::new(), "upstream overloaded");
        assert!(error.is_retryable());
        match error {
            GenError::ProviderError {
                provider,
                status,
                body,
                ..
            } => {
                assert_eq!(provider, "openai");
                assert_eq!(status, 503);
                assert_eq!(body.as_deref(), Some("upstream overloaded"));
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn empty_body_falls_back_to_the_canonical_reason() {
        let error = classify_http_error("openai", 500, &HeaderMap::new(), "");
        match error {
            GenError::ProviderError { message, body, .. } => {
                assert_eq!(message, "Internal Server Error");
                assert_eq!(body, None);
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn oversized_bodies_are_clipped() {
        let body = "x".repeat(1000);
        let error = classify_http_error("openai", 418, &HeaderMap::new(), &body);
        match error {
            GenError::InvalidRequest { message, .. } => {
                assert!(message.len() < 250);
                assert!(message.ends_with("..."));
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }
}
