//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for NowPlaying
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum NowPlayingError {
    /// A required request field or query parameter was absent.
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    /// The provider redirected back with an `error` instead of a code.
    #[error("Provider authorization error: {0}")]
    ProviderAuthorization(String),

    /// The token endpoint answered with a non-success status.
    #[error("Token exchange failed with status {status}: {body}")]
    ExchangeFailed { status: u16, body: String },

    /// The protected resource rejected the access token (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The protected resource answered with some other error status.
    #[error("Upstream error with status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl NowPlayingError {
    /// Stable label for logs and error bodies.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::MissingParameter(_) => "missing_parameter",
            Self::ProviderAuthorization(_) => "provider_authorization",
            Self::ExchangeFailed { .. } => "exchange_failed",
            Self::Unauthorized(_) => "unauthorized",
            Self::Upstream { .. } => "upstream_error",
            Self::Network(_) => "network_failure",
            Self::Config(_) => "config",
            Self::Storage(_) => "storage",
            Self::InvalidInput(_) => "invalid_input",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether the error means the held token can no longer be used.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

/// Result type alias for NowPlaying operations
pub type Result<T> = std::result::Result<T, NowPlayingError>;
