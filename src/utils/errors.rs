//! Error handling for the TonTin client
//!
//! This module defines the main error types used throughout the crate,
//! including the translation of HTTP status codes into user-facing messages.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the TonTin client
#[derive(Error, Debug)]
pub enum TontinError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Coarse classification of a failed API call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiErrorKind {
    /// No response was received (status 0)
    Network,
    Unauthorized,
    Forbidden,
    Validation,
    NotFound,
    Conflict,
    RateLimited,
    Timeout,
    Server,
    Other,
}

impl ApiErrorKind {
    /// Classify an HTTP status code
    pub fn from_status(status: u16) -> Self {
        match status {
            0 => ApiErrorKind::Network,
            401 => ApiErrorKind::Unauthorized,
            403 => ApiErrorKind::Forbidden,
            400 | 422 => ApiErrorKind::Validation,
            404 => ApiErrorKind::NotFound,
            408 | 504 => ApiErrorKind::Timeout,
            409 => ApiErrorKind::Conflict,
            429 => ApiErrorKind::RateLimited,
            500..=599 => ApiErrorKind::Server,
            _ => ApiErrorKind::Other,
        }
    }
}

/// A failed call against the TonTin backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("HTTP {status}: {message}")]
pub struct ApiError {
    /// HTTP status, or 0 when the server could not be reached
    pub status: u16,
    pub kind: ApiErrorKind,
    /// Message shown to the user
    pub message: String,
    /// Raw response body, if any
    pub body: Option<String>,
}

impl ApiError {
    /// Build an error from a status code and an optional response body.
    ///
    /// A `message` field in a JSON body takes precedence over the
    /// generic message for the status.
    pub fn from_response(status: u16, body: Option<String>) -> Self {
        let server_message = body
            .as_deref()
            .and_then(|text| serde_json::from_str::<serde_json::Value>(text).ok())
            .and_then(|value| value.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .filter(|m| !m.trim().is_empty());

        Self {
            status,
            kind: ApiErrorKind::from_status(status),
            message: server_message.unwrap_or_else(|| status_message(status).to_string()),
            body,
        }
    }

    /// Error for a request that never got a response
    pub fn network() -> Self {
        Self::from_response(0, None)
    }

    /// Error for a request that timed out on the client side
    pub fn timeout() -> Self {
        Self {
            status: 0,
            kind: ApiErrorKind::Timeout,
            message: status_message(408).to_string(),
            body: None,
        }
    }

    /// Title used when the error is surfaced as a toast
    pub fn title(&self) -> &'static str {
        status_title(self.status)
    }

    /// Route the UI should move to after this error, if any
    pub fn redirect(&self) -> Option<&'static str> {
        match self.status {
            401 => Some("/auth/login"),
            403 => Some("/unauthorized"),
            _ => None,
        }
    }

    /// Whether the failure is worth retrying for idempotent requests
    pub fn is_transient(&self) -> bool {
        matches!(self.kind, ApiErrorKind::Network | ApiErrorKind::Server | ApiErrorKind::Timeout)
    }
}

/// Generic message for an HTTP status
pub fn status_message(status: u16) -> &'static str {
    match status {
        0 => "Unable to connect to the server. Please check your internet connection.",
        400 => "Invalid request. Please check your input.",
        401 => "Your session has expired. Please log in again.",
        403 => "You do not have permission to perform this action.",
        404 => "The requested resource was not found.",
        408 => "The request timed out. Please try again.",
        409 => "This action conflicts with existing data.",
        422 => "The submitted data is invalid.",
        429 => "Too many requests. Please wait a moment and try again.",
        500 => "An internal server error occurred. Please try again later.",
        502 => "Bad gateway. The server is temporarily unavailable.",
        503 => "The service is temporarily unavailable. Please try again later.",
        504 => "The server took too long to respond. Please try again.",
        _ => "An unexpected error occurred.",
    }
}

/// Toast title for an HTTP status
pub fn status_title(status: u16) -> &'static str {
    match status {
        0 => "Connection Error",
        s if s >= 500 => "Server Error",
        s if s >= 400 => "Request Error",
        _ => "Error",
    }
}

/// Message for a failed login, registration or token call
pub fn auth_status_message(status: u16) -> &'static str {
    match status {
        0 => "Cannot connect to server. Please check your connection.",
        400 => "Invalid request. Please check your input!",
        401 => "Invalid credentials. Please try again.",
        403 => "Access denied. Your account may be disabled.",
        404 => "Resource not found.",
        409 => "User already exists with this email or username.",
        500 => "Server error. Please try again later.",
        _ => "An unexpected error occurred. Please try again.",
    }
}

/// Payment specific errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Payment processor is not configured")]
    NotConfigured,

    #[error("Payment not possible: {0}")]
    NotEligible(String),

    #[error("Card declined: {0}")]
    Declined(String),

    #[error("Payment processor error: {0}")]
    Processor(String),
}

/// Result type alias for TonTin operations
pub type Result<T> = std::result::Result<T, TontinError>;

impl TontinError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            TontinError::Api(e) => e.is_transient(),
            TontinError::Payment(PaymentError::Processor(_)) => true,
            TontinError::Payment(_) => false,
            TontinError::Config(_) => false,
            TontinError::InvalidStateTransition { .. } => false,
            TontinError::InvariantViolation(_) => false,
            TontinError::Http(_) => true,
            TontinError::Serialization(_) => false,
            TontinError::Io(_) => true,
            TontinError::UrlParse(_) => false,
            TontinError::Authentication(_) => false,
            TontinError::NotAuthenticated => false,
            TontinError::InvalidInput(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TontinError::Config(_) => ErrorSeverity::Critical,
            TontinError::InvariantViolation(_) => ErrorSeverity::Critical,
            TontinError::Api(e) if e.kind == ApiErrorKind::Server => ErrorSeverity::Error,
            TontinError::Api(_) => ErrorSeverity::Warning,
            TontinError::Authentication(_) | TontinError::NotAuthenticated => ErrorSeverity::Warning,
            TontinError::Payment(PaymentError::Declined(_)) => ErrorSeverity::Warning,
            TontinError::InvalidInput(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// Text suitable for inline display next to a form or action
    pub fn user_message(&self) -> String {
        match self {
            TontinError::Api(e) => e.message.clone(),
            TontinError::Http(e) if e.is_timeout() => status_message(408).to_string(),
            TontinError::Http(_) => status_message(0).to_string(),
            TontinError::Payment(e) => e.to_string(),
            TontinError::InvalidInput(msg) | TontinError::Authentication(msg) => msg.clone(),
            TontinError::NotAuthenticated => status_message(401).to_string(),
            _ => status_message(u16::MAX).to_string(),
        }
    }

    /// HTTP status of the underlying API failure, if there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            TontinError::Api(e) => Some(e.status),
            _ => None,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(ApiErrorKind::from_status(0), ApiErrorKind::Network);
        assert_eq!(ApiErrorKind::from_status(401), ApiErrorKind::Unauthorized);
        assert_eq!(ApiErrorKind::from_status(422), ApiErrorKind::Validation);
        assert_eq!(ApiErrorKind::from_status(409), ApiErrorKind::Conflict);
        assert_eq!(ApiErrorKind::from_status(503), ApiErrorKind::Server);
        assert_eq!(ApiErrorKind::from_status(418), ApiErrorKind::Other);
    }

    #[test]
    fn test_server_message_wins() {
        let err = ApiError::from_response(400, Some(r#"{"message":"Name is too short"}"#.to_string()));
        assert_eq!(err.message, "Name is too short");
        assert_eq!(err.title(), "Request Error");

        let err = ApiError::from_response(500, Some("<html>oops</html>".to_string()));
        assert_eq!(err.message, status_message(500));
        assert_eq!(err.title(), "Server Error");
    }

    #[test]
    fn test_redirects() {
        assert_eq!(ApiError::from_response(401, None).redirect(), Some("/auth/login"));
        assert_eq!(ApiError::from_response(403, None).redirect(), Some("/unauthorized"));
        assert_eq!(ApiError::from_response(404, None).redirect(), None);
        assert_eq!(ApiError::network().title(), "Connection Error");
    }

    #[test]
    fn test_recoverability() {
        assert!(TontinError::from(ApiError::from_response(502, None)).is_recoverable());
        assert!(TontinError::from(ApiError::network()).is_recoverable());
        assert!(!TontinError::from(ApiError::from_response(409, None)).is_recoverable());
        assert!(!TontinError::InvalidInput("x".into()).is_recoverable());
    }

    #[test]
    fn test_severity() {
        assert_eq!(TontinError::Config("x".into()).severity(), ErrorSeverity::Critical);
        assert_eq!(TontinError::InvalidInput("x".into()).severity(), ErrorSeverity::Info);
        assert_eq!(
            TontinError::from(ApiError::from_response(500, None)).severity(),
            ErrorSeverity::Error
        );
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARN");
    }

    #[test]
    fn test_auth_messages() {
        assert_eq!(auth_status_message(401), "Invalid credentials. Please try again.");
        assert_eq!(auth_status_message(409), "User already exists with this email or username.");
    }
}
