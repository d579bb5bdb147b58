//! Failure outcomes of remote AI calls.

use thiserror::Error;

/// Type alias for Results of remote AI calls.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Categories of remote failure.
///
/// Every kind collapses to the same local fallback at the classifier and
/// search resolver boundaries; the kind is kept for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Request could not be sent or the connection broke.
    Transport,
    /// No answer within the configured timeout.
    Timeout,
    /// The service answered with a non-success HTTP status.
    Status,
    /// The answer did not have the expected JSON shape.
    Malformed,
    /// No usable provider (missing API key, offline).
    Unavailable,
}

#[derive(Debug, Error)]
#[error("{kind:?}: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transport, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message)
    }

    pub fn status(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Status, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Malformed, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unavailable, message)
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(err.to_string())
        } else if err.is_decode() {
            Self::malformed(err.to_string())
        } else if let Some(status) = err.status() {
            Self::status(status.to_string())
        } else {
            Self::transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed(err.to_string())
    }
}
