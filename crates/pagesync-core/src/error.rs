//! Sync error handling
//!
//! Provides typed errors for the sync pipeline. The reconciler uses
//! [`SyncError::is_retryable`] to decide whether a failed attempt is worth
//! repeating: transient network trouble is, bad data and missing credentials
//! are not.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while detecting, downloading, or applying content
#[derive(Error, Debug)]
pub enum SyncError {
    /// Transport-level failure (connection refused, timeout, DNS)
    #[error("Network error: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    /// Remote answered with a non-2xx status
    #[error("Remote returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Remote artifact does not exist
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// Envelope or document failed validation
    #[error("Invalid content payload: {reason}")]
    Validation { reason: String },

    /// Credential missing, expired, or rejected
    #[error("Authentication failed: {reason}. Provide a fresh bearer token and try again.")]
    Auth { reason: String },

    /// Local durable storage failure
    #[error("Storage error at '{path}': {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON serialization failure
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl SyncError {
    /// Build an HTTP error from a status code and response body
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        SyncError::Http {
            status,
            body: body.into(),
        }
    }

    /// Classify an HTTP status into the error taxonomy
    ///
    /// 401/403 become [`SyncError::Auth`], 404 becomes
    /// [`SyncError::NotFound`], everything else stays [`SyncError::Http`].
    pub fn from_status(status: u16, what: &str, body: String) -> Self {
        match status {
            401 | 403 => SyncError::Auth {
                reason: format!("{} (HTTP {})", what, status),
            },
            404 => SyncError::NotFound {
                what: what.to_string(),
            },
            _ => SyncError::Http { status, body },
        }
    }

    /// Whether the reconciler should retry after this error
    ///
    /// Transport failures, rate limiting, and server errors are transient.
    /// Validation, auth, and not-found failures will not improve on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Network { .. } => true,
            SyncError::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether this error should surface as a degraded-auth condition
    pub fn is_auth(&self) -> bool {
        matches!(self, SyncError::Auth { .. })
    }
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_are_retryable() {
        assert!(SyncError::http(500, "internal").is_retryable());
        assert!(SyncError::http(503, "unavailable").is_retryable());
        assert!(SyncError::http(429, "slow down").is_retryable());
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        assert!(!SyncError::http(400, "bad request").is_retryable());
        assert!(!SyncError::NotFound {
            what: "content file".to_string()
        }
        .is_retryable());
        assert!(!SyncError::Validation {
            reason: "marker mismatch".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_status_classification() {
        let err = SyncError::from_status(403, "metadata fetch", String::new());
        assert!(err.is_auth());
        assert!(!err.is_retryable());

        let err = SyncError::from_status(404, "content file", String::new());
        assert!(matches!(err, SyncError::NotFound { .. }));

        let err = SyncError::from_status(502, "download", "bad gateway".to_string());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = SyncError::Auth {
            reason: "token expired".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Authentication failed"));
        assert!(msg.contains("token expired"));
    }
}
