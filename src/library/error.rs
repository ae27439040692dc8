//! Error types for the library backend client and token storage.

use std::path::PathBuf;

use thiserror::Error;

use crate::http_client::ClientBuildError;

/// Errors raised while persisting or loading the session token.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    /// Reading, writing or removing the token file failed
    #[error("cannot access token file {}: {source}\n  Suggestion: Check the file permissions or set token_path in the config file", .path.display())]
    Io {
        /// Token file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Neither `XDG_CONFIG_HOME` nor `HOME` is set
    #[error("cannot determine a config directory for the token file\n  Suggestion: Set HOME or XDG_CONFIG_HOME, or configure token_path explicitly")]
    ConfigDirUnavailable,
}

impl TokenStoreError {
    /// Creates an `Io` error for the given path.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors returned by [`LibraryClient`](super::LibraryClient) operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The backend could not be reached
    #[error("cannot reach the library service at {base_url}: {source}\n  Suggestion: Check your internet connection or the configured api_base_url")]
    Transport {
        /// Backend base URL
        base_url: String,
        /// Underlying transport error
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-success status
    #[error("{message} (HTTP {status})")]
    Status {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// The response body did not have the expected shape
    #[error("unexpected library service response: {reason}")]
    Decode {
        /// Decoder diagnostic
        reason: String,
    },

    /// The configured base URL is not a usable http(s) URL
    #[error("invalid library API base URL '{url}': {reason}\n  Suggestion: Use a full URL such as https://example.com/api")]
    InvalidBaseUrl {
        /// Rejected URL
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// Token persistence failed
    #[error(transparent)]
    Token(#[from] TokenStoreError),

    /// The HTTP client could not be built
    #[error(transparent)]
    ClientBuild(#[from] ClientBuildError),
}

impl ApiError {
    /// Creates a `Decode` error.
    #[must_use]
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }

    /// Returns the HTTP status for `Status` errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true when the backend rejected the session (HTTP 401/403).
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}
