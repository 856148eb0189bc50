//! Mapping of HTTP outcomes onto the reconciliation error model

use declarative::Error;
use serde_json::Value;

/// Longest body excerpt kept in a rejection message.
const MAX_MESSAGE_LEN: usize = 300;

/// Failure before a status line was received.
pub(crate) fn transport(err: ureq::Error) -> Error {
    match err {
        ureq::Error::StatusCode(code) => Error::rejected(code, format!("HTTP {code}")),
        other => Error::Transport(other.to_string()),
    }
}

/// Body present but not in the expected shape.
pub(crate) fn decode(err: impl std::fmt::Display) -> Error {
    Error::Decode(err.to_string())
}

/// Non-success status; the hub usually answers `{"error": "..."}`.
pub(crate) fn rejection(status: u16, body: &str) -> Error {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            ["error", "message"]
                .iter()
                .find_map(|field| json.get(field).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| excerpt(body.trim()));

    if message.is_empty() {
        Error::rejected(status, format!("HTTP {status}"))
    } else {
        Error::rejected(status, message)
    }
}

fn excerpt(body: &str) -> String {
    if body.len() <= MAX_MESSAGE_LEN {
        return body.to_string();
    }
    let mut end = MAX_MESSAGE_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::ErrorCategory;

    #[test]
    fn test_rejection_prefers_error_field() {
        let err = rejection(409, r#"{"error": "You already created this space repo"}"#);
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.category(), ErrorCategory::Conflict);
        assert!(err.to_string().contains("already created"));
    }

    #[test]
    fn test_rejection_falls_back_to_body() {
        let err = rejection(502, "Bad Gateway");
        assert!(err.to_string().contains("Bad Gateway"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_rejection_empty_body() {
        let err = rejection(401, "");
        assert_eq!(err.category(), ErrorCategory::Auth);
        assert!(err.to_string().contains("HTTP 401"));
    }

    #[test]
    fn test_long_body_is_truncated() {
        let body = "é".repeat(400);
        let Error::RemoteRejected { message, .. } = rejection(500, &body) else {
            panic!("expected rejection");
        };
        assert!(message.len() <= MAX_MESSAGE_LEN + '…'.len_utf8());
        assert!(message.ends_with('…'));
    }

    #[test]
    fn test_status_code_error_is_rejection() {
        assert_eq!(transport(ureq::Error::StatusCode(404)).status(), Some(404));
    }

    #[test]
    fn test_other_ureq_errors_are_transport() {
        let err = transport(ureq::Error::ConnectionFailed);
        assert_eq!(err.category(), ErrorCategory::Transport);
    }
}
