use serde::Deserialize;
use thiserror::Error;

/// Shown when the endpoint rejects the credentials without a usable detail.
pub const AUTH_FAILED_MESSAGE: &str = "Authentication failed!";

/// Shown for anything that went wrong before a verdict could be read.
pub const TRANSPORT_FAILURE_MESSAGE: &str = "An error occurred. Please try again later.";

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Rejected with status {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Rejected {
        status: reqwest::StatusCode,
        detail: Option<String>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Error body shape used by the token endpoint (`{"detail": "..."}`).
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

impl AuthError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// Build a rejection from a non-success status and its raw body.
    ///
    /// Only a non-empty string `detail` is kept; validation errors that carry
    /// a list, empty bodies and non-JSON bodies all end up without detail.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let detail = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.detail)
            .and_then(|d| match d {
                serde_json::Value::String(s) if !s.is_empty() => Some(s),
                _ => None,
            });
        AuthError::Rejected { status, detail }
    }

    /// The text to put in front of the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Rejected {
                detail: Some(detail),
                ..
            } => detail.clone(),
            AuthError::Rejected { detail: None, .. } => AUTH_FAILED_MESSAGE.to_string(),
            AuthError::Network(_) | AuthError::InvalidResponse(_) => {
                TRANSPORT_FAILURE_MESSAGE.to_string()
            }
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, AuthError::Rejected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_keeps_string_detail() {
        let err = AuthError::from_status(
            StatusCode::UNAUTHORIZED,
            r#"{"detail": "Invalid credentials"}"#,
        );
        assert_eq!(err.user_message(), "Invalid credentials");
        assert!(err.is_rejection());
    }

    #[test]
    fn test_from_status_falls_back_without_detail() {
        for body in ["", "not json", "{}", r#"{"detail": ""}"#, r#"{"detail": null}"#] {
            let err = AuthError::from_status(StatusCode::UNAUTHORIZED, body);
            assert_eq!(err.user_message(), AUTH_FAILED_MESSAGE, "body: {body:?}");
        }
    }

    #[test]
    fn test_from_status_ignores_structured_detail() {
        // FastAPI-style 422 bodies carry a list of field errors
        let body = r#"{"detail": [{"loc": ["body", "username"], "msg": "field required"}]}"#;
        let err = AuthError::from_status(StatusCode::UNPROCESSABLE_ENTITY, body);
        assert_eq!(err.user_message(), AUTH_FAILED_MESSAGE);
    }

    #[test]
    fn test_invalid_response_uses_transport_message() {
        let err = AuthError::InvalidResponse("missing access_token".to_string());
        assert_eq!(err.user_message(), TRANSPORT_FAILURE_MESSAGE);
        assert!(!err.is_rejection());
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(AuthError::truncate_body("short"), "short");
        let long = "x".repeat(600);
        let truncated = AuthError::truncate_body(&long);
        assert!(truncated.starts_with(&"x".repeat(500)));
        assert!(truncated.ends_with("(truncated, 600 total bytes)"));
    }
}
