//! Error types for the deployment monitor

use std::fmt;

use thiserror::Error;

/// Main error type for the deployment monitor
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Remote status error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Launch error: {0}")]
    LaunchError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for MonitorError {
    fn from(err: anyhow::Error) -> Self {
        MonitorError::Internal(err.to_string())
    }
}

/// Classification of a failed status check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// Connection refused, timeout, DNS failure or any other send failure
    Network,

    /// The endpoint answered with a non-success status
    Http { status: u16, body: String },

    /// The body was not a JSON object with the expected shape
    Malformed,
}

/// A failed call to the deployment status endpoint
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: RemoteErrorKind::Network,
            message: message.into(),
        }
    }

    pub fn http(status: u16, body: &str) -> Self {
        let body = crate::utils::truncate_chars(body, MAX_BODY_EXCERPT);
        Self {
            message: format!("HTTP {}: {}", status, body),
            kind: RemoteErrorKind::Http { status, body },
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: RemoteErrorKind::Malformed,
            message: message.into(),
        }
    }

    /// Only network failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        self.kind == RemoteErrorKind::Network
    }

    /// Rejected credentials (HTTP 401/403)
    pub fn is_auth(&self) -> bool {
        matches!(self.kind, RemoteErrorKind::Http { status: 401 | 403, .. })
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            RemoteErrorKind::Network => "network",
            RemoteErrorKind::Http { .. } => "http",
            RemoteErrorKind::Malformed => "malformed",
        };
        write!(f, "{} error: {}", label, self.message)
    }
}

/// Longest body excerpt kept on an HTTP failure
pub const MAX_BODY_EXCERPT: usize = 200;
