//! Maps HTTP failures onto [`ApiError`].
//!
//! Error bodies come in two shapes: the framework's `{"detail": ...}` and
//! RFC 9457 problem documents. Either way the most specific human-readable
//! text ends up in `ApiError::Server::detail`.

use leadpilot_api_models::{ErrorResponse, ProblemDetails};
use leadpilot_sync::ApiError;
use reqwest::Response;

/// Classify a non-success response.
pub async fn classify(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let bytes = response.bytes().await.unwrap_or_default();
    ApiError::Server {
        status,
        detail: detail_from_body(&bytes),
    }
}

/// Extract the most specific message from an error body.
#[must_use]
pub fn detail_from_body(bytes: &[u8]) -> Option<String> {
    if let Ok(problem) = serde_json::from_slice::<ProblemDetails>(bytes) {
        return Some(problem.detail.unwrap_or(problem.title));
    }
    if let Ok(body) = serde_json::from_slice::<ErrorResponse>(bytes) {
        let message = body.message();
        return (!message.is_empty()).then_some(message);
    }
    let text = String::from_utf8_lossy(bytes).trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Classify a `reqwest` failure raised before or while reading a response.
#[must_use]
pub fn from_transport(err: &reqwest::Error, operation: &'static str) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout { operation }
    } else if err.is_connect() {
        ApiError::Unreachable
    } else if err.is_decode() {
        ApiError::Decode {
            detail: err.to_string(),
        }
    } else {
        ApiError::Transport {
            detail: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_problem_detail() {
        let body = br#"{"type":"about:blank","title":"Conflict","status":409,"detail":"job already running"}"#;
        assert_eq!(detail_from_body(body).as_deref(), Some("job already running"));
        let body = br#"{"type":"about:blank","title":"Conflict","status":409}"#;
        assert_eq!(detail_from_body(body).as_deref(), Some("Conflict"));
    }

    #[test]
    fn flattens_validation_detail_list() {
        let body = br#"{"detail":[{"loc":["body","limit"],"msg":"too large"},{"msg":"bad city"}]}"#;
        assert_eq!(detail_from_body(body).as_deref(), Some("too large; bad city"));
        let body = br#"{"detail":"Lead not found"}"#;
        assert_eq!(detail_from_body(body).as_deref(), Some("Lead not found"));
    }

    #[test]
    fn falls_back_to_plain_text_or_nothing() {
        assert_eq!(detail_from_body(b"  upstream down \n").as_deref(), Some("upstream down"));
        assert_eq!(detail_from_body(b""), None);
    }
}
