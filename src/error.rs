//! Client error taxonomy.
//!
//! DESIGN
//! ======
//! Three classes reach callers: validation failures caught before any
//! request is built, authorization denials (401/403) that have already torn
//! the session down, and everything else the backend or transport produced.
//! Nothing in this crate retries; `retryable` is advisory for callers.

use crate::storage::StorageError;
use crate::validation::ValidationError;

/// Grepable error code and retryable flag for CLI output and log fields.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// Errors produced by session, store, and transport operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Input rejected client-side; no request was sent.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The action needs a logged-in session and none exists.
    #[error("not logged in")]
    NotAuthenticated,

    /// The backend denied the request (401/403). The session was torn down.
    #[error("authorization denied: HTTP {status}")]
    Unauthorized { status: u16 },

    /// The backend returned another non-success status.
    #[error("server returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The HTTP request itself failed (connect, timeout, body read).
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A header value could not be constructed.
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// A request or response body could not be (de)serialized.
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A timestamp could not be formatted for a query string.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(#[from] time::error::Format),

    /// Durable storage could not be read or written.
    #[error("storage failed: {0}")]
    Storage(#[from] StorageError),

    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Config(String),

    /// A lookup found nothing after the cache was populated.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
}

impl ClientError {
    /// True for errors that triggered the global session teardown.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

impl ErrorCode for ClientError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::NotAuthenticated => "E_NOT_AUTHENTICATED",
            Self::Unauthorized { .. } => "E_UNAUTHORIZED",
            Self::Api { .. } => "E_API_RESPONSE",
            Self::Http(_) => "E_HTTP",
            Self::InvalidHeader(_) => "E_INVALID_HEADER",
            Self::InvalidJson(_) => "E_INVALID_JSON",
            Self::InvalidTimestamp(_) => "E_INVALID_TIMESTAMP",
            Self::Storage(_) => "E_STORAGE",
            Self::Config(_) => "E_CONFIG",
            Self::NotFound { .. } => "E_NOT_FOUND",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Api { status: 429 | 500..=599, .. })
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
