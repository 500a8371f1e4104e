//! Error types for scrublog-core

use http::StatusCode;
use std::fmt;

/// Result type alias for handler and middleware operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Status-carrying error returned by handlers and middleware.
///
/// The status code is what a framework-level error handler would render
/// for this failure, and it is what the logging pipeline reads when a
/// downstream handler fails before producing a response.
#[derive(Debug, Clone)]
pub struct Error {
    /// HTTP status code a renderer would produce for this error
    pub status: StatusCode,
    /// Error type identifier (machine-readable, snake_case)
    pub kind: String,
    /// Human-readable error message
    pub message: String,
}

impl Error {
    /// Create a new error with an explicit status code
    pub fn new(status: StatusCode, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Create a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    /// Create a 401 Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    /// Create a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    /// Create a 500 Internal Server Error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }

    /// The status code carried by this error
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {}

// Conversion from common error types
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::bad_request(format!("Invalid JSON: {}", err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::internal(format!("I/O error: {}", err))
    }
}
