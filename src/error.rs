//! Error types for backend requests.
//!
//! The application layer works with `anyhow`; this type is kept concrete so
//! the sync engine can decide what a failed fetch means (retry, empty
//! snapshot, fallback value) without string matching.

use thiserror::Error;

/// Errors returned by backend calls.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The backend could not be reached.
    #[error("Cannot connect to backend at {0}")]
    Connect(String),

    /// The request did not complete in time.
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// The backend answered with a non-success status.
    #[error("Backend error {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Any other transport failure.
    #[error("Request failed: {0}")]
    Request(String),
}

impl ApiError {
    /// Map a transport error the same way for every endpoint.
    pub fn from_reqwest(err: reqwest::Error, base_url: &str, timeout_seconds: u64) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(timeout_seconds)
        } else if err.is_connect() {
            ApiError::Connect(base_url.to_string())
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Request(err.to_string())
        }
    }

    /// Whether retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Connect(_) | ApiError::Timeout(_) | ApiError::Request(_) => true,
            ApiError::Status { status, .. } => *status >= 500,
            ApiError::Decode(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ApiError::Timeout(30).is_transient());
        assert!(ApiError::Connect("http://localhost:8000".to_string()).is_transient());
        assert!(ApiError::Status {
            status: 503,
            body: String::new()
        }
        .is_transient());
        assert!(!ApiError::Status {
            status: 404,
            body: "Task not found".to_string()
        }
        .is_transient());
        assert!(!ApiError::Decode("bad json".to_string()).is_transient());
    }

    #[test]
    fn test_display() {
        let err = ApiError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Backend error 500: boom");
    }
}
