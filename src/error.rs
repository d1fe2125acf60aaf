//! Typed errors surfaced to callers of queries and mutations.
//!
//! Every failure that reaches the UI layer is an [`AppError`]: a human-readable
//! `message` plus a machine-readable [`ErrorCode`]. Transport and retry layers
//! never produce these directly; they return an
//! [`Outcome`](crate::transport::Outcome) which the
//! [`envelope`](crate::envelope) normalizer converts.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Field-level error details, keyed by field name.
pub type ErrorDetails = BTreeMap<String, Vec<String>>;

/// Machine-readable error classification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// No response was received.
    Network,
    /// The request deadline was exceeded.
    Timeout,
    /// The server responded with structured field errors.
    Validation,
    /// The response body had an unexpected shape.
    Unknown,
    /// The server responded with a non-success status and no explicit code.
    Http(u16),
    /// A code supplied by the server in the response body.
    Server(String),
}

impl ErrorCode {
    /// Returns `true` for failures where no response was received.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Network | Self::Timeout)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => f.write_str("NETWORK_ERROR"),
            Self::Timeout => f.write_str("TIMEOUT_ERROR"),
            Self::Validation => f.write_str("VALIDATION_ERROR"),
            Self::Unknown => f.write_str("UNKNOWN_ERROR"),
            Self::Http(status) => write!(f, "{status}"),
            Self::Server(code) => f.write_str(code),
        }
    }
}

/// Error payload returned from every query and mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct AppError {
    /// Stable machine-readable code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Optional field errors or server detail.
    pub details: Option<ErrorDetails>,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
}

impl AppError {
    /// Construct an error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            status: None,
        }
    }

    /// Attach field-level details.
    #[must_use]
    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.details = Some(details);
        self
    }

    /// Attach the HTTP status the error came from.
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Build a `NETWORK_ERROR`.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Network, message)
    }

    /// Build a `TIMEOUT_ERROR`.
    #[must_use]
    pub fn timeout() -> Self {
        Self::new(ErrorCode::Timeout, "Request timed out")
    }

    /// Build an `UNKNOWN_ERROR`.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unknown, message)
    }

    /// Returns `true` if the server reported field validation errors.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.code == ErrorCode::Validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::Network.to_string(), "NETWORK_ERROR");
        assert_eq!(ErrorCode::Timeout.to_string(), "TIMEOUT_ERROR");
        assert_eq!(ErrorCode::Validation.to_string(), "VALIDATION_ERROR");
        assert_eq!(ErrorCode::Unknown.to_string(), "UNKNOWN_ERROR");
        assert_eq!(ErrorCode::Http(404).to_string(), "404");
        assert_eq!(
            ErrorCode::Server("PET_UNAVAILABLE".to_string()).to_string(),
            "PET_UNAVAILABLE"
        );
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::new(ErrorCode::Http(500), "HTTP 500 Error").with_status(500);
        assert_eq!(err.to_string(), "500: HTTP 500 Error");
        assert_eq!(err.status, Some(500));
    }

    #[test]
    fn test_transport_codes() {
        assert!(AppError::network("offline").code.is_transport());
        assert!(AppError::timeout().code.is_transport());
        assert!(!ErrorCode::Http(503).is_transport());
    }

    #[test]
    fn test_with_details() {
        let mut details = ErrorDetails::new();
        details.insert("email".to_string(), vec!["is invalid".to_string()]);

        let err = AppError::new(ErrorCode::Validation, "Invalid form").with_details(details);
        assert!(err.is_validation());
        assert_eq!(
            err.details.as_ref().and_then(|d| d.get("email")),
            Some(&vec!["is invalid".to_string()])
        );
    }
}
