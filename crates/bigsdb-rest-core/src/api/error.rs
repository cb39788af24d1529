use std::path::PathBuf;

use thiserror::Error;

use crate::auth::CredentialKind;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Access denied - client is unauthorized: {0}")]
    AccessDenied(String),

    #[error("Session token rejected after renewal: {0}")]
    SessionRejected(String),

    #[error("Failed to obtain {kind} token: {message}")]
    ExchangeFailed { kind: CredentialKind, message: String },

    #[error("{label} {} does not exist.", .path.display())]
    LocalFileMissing { label: &'static str, path: PathBuf },

    #[error("Error {status}: {body}")]
    Unexpected { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Credential store error: {0}")]
    Store(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Pull the `message` field out of a BIGSdb error document, falling back
    /// to the raw body when it isn't JSON.
    pub fn server_message(body: &str) -> String {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or_else(|| Self::truncate_body(body))
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            400 => ApiError::BadRequest(Self::server_message(body)),
            401 => ApiError::AccessDenied(Self::server_message(body)),
            404 => ApiError::NotFound(Self::server_message(body)),
            code => ApiError::Unexpected {
                status: code,
                body: Self::truncate_body(body),
            },
        }
    }

    /// Whether the CLI should exit non-zero for this error. Request-level
    /// rejections abort the operation but are not process failures.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ApiError::BadRequest(_) | ApiError::AccessDenied(_) | ApiError::Unexpected { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_server_message_json() {
        let body = r#"{"status":401,"message":"Client is unauthorized to access this resource."}"#;
        assert_eq!(
            ApiError::server_message(body),
            "Client is unauthorized to access this resource."
        );
    }

    #[test]
    fn test_server_message_plain_text() {
        assert_eq!(ApiError::server_message("Internal error"), "Internal error");
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(600);
        let truncated = ApiError::truncate_body(&long);
        assert!(truncated.starts_with(&"x".repeat(500)));
        assert!(truncated.ends_with("(truncated, 600 total bytes)"));
    }

    #[test]
    fn test_from_status() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"message":"No sequences"}"#);
        assert!(matches!(err, ApiError::BadRequest(ref m) if m == "No sequences"));
        assert!(!err.is_fatal());

        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(matches!(err, ApiError::Unexpected { status: 500, ref body } if body == "boom"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(ApiError::NotFound("Database x does not exist.".into()).is_fatal());
        assert!(ApiError::ExchangeFailed {
            kind: CredentialKind::Access,
            message: "Invalid verifier".into()
        }
        .is_fatal());
        assert!(ApiError::LocalFileMissing {
            label: "Sequence file",
            path: PathBuf::from("missing.fas")
        }
        .is_fatal());
        assert!(!ApiError::AccessDenied("unauthorized".into()).is_fatal());
    }

    #[test]
    fn test_local_file_missing_message() {
        let err = ApiError::LocalFileMissing {
            label: "Profiles file",
            path: PathBuf::from("profiles.txt"),
        };
        assert_eq!(err.to_string(), "Profiles file profiles.txt does not exist.");
    }
}
