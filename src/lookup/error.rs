//! Error types for metadata lookups.
//!
//! Errors follow the What/Why/Fix message shape used across the project.
//! "No such record" is not an error: adapters report it as
//! [`SourceStep::NotFound`](super::SourceStep::NotFound).

use thiserror::Error;

/// Transient failures while querying a bibliographic source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The source could not be reached (DNS, connect, TLS, timeout)
    #[error("{source_name} lookup failed: {reason}\n  Suggestion: {suggestion}")]
    SourceUnavailable {
        /// Human-readable source name
        source_name: String,
        /// What went wrong
        reason: String,
        /// How to fix the issue
        suggestion: String,
    },

    /// The source answered with a status that is neither success nor "not found"
    #[error("{source_name} returned HTTP {status}: {reason}\n  Suggestion: {suggestion}")]
    UnexpectedStatus {
        /// Human-readable source name
        source_name: String,
        /// HTTP status code
        status: u16,
        /// What the status means
        reason: String,
        /// How to fix the issue
        suggestion: String,
    },

    /// The response body could not be decoded
    #[error("unexpected {source_name} response format: {reason}")]
    InvalidResponse {
        /// Human-readable source name
        source_name: String,
        /// Decoder diagnostic
        reason: String,
    },

    /// The adapter's HTTP client could not be built
    #[error("{source_name} lookup unavailable: {reason}")]
    ClientBuild {
        /// Human-readable source name
        source_name: String,
        /// Builder diagnostic
        reason: String,
    },
}

impl LookupError {
    /// Creates a `SourceUnavailable` error for a transport failure.
    #[must_use]
    pub fn unavailable(source_name: &str) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.to_string(),
            reason: format!("cannot reach {source_name}"),
            suggestion: "Check your internet connection and try again".to_string(),
        }
    }

    /// Creates an `UnexpectedStatus` error with a status-specific explanation.
    #[must_use]
    pub fn unexpected_status(source_name: &str, status: u16) -> Self {
        let (reason, suggestion) = match status {
            401 | 403 => (
                "request was rejected",
                "Check the configured API key for this source",
            ),
            429 => (
                "rate limit exceeded",
                "Wait a few seconds before looking up another ISBN",
            ),
            s if s >= 500 => ("service unavailable", "Try again later"),
            _ => ("unexpected response", "Try again later"),
        };
        Self::UnexpectedStatus {
            source_name: source_name.to_string(),
            status,
            reason: reason.to_string(),
            suggestion: suggestion.to_string(),
        }
    }

    /// Creates an `InvalidResponse` error.
    #[must_use]
    pub fn invalid_response(source_name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a `ClientBuild` error.
    #[must_use]
    pub fn client_build(source_name: &str, reason: impl Into<String>) -> Self {
        Self::ClientBuild {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns the name of the source that produced the error.
    #[must_use]
    pub fn source_name(&self) -> &str {
        match self {
            Self::SourceUnavailable { source_name, .. }
            | Self::UnexpectedStatus { source_name, .. }
            | Self::InvalidResponse { source_name, .. }
            | Self::ClientBuild { source_name, .. } => source_name,
        }
    }
}
