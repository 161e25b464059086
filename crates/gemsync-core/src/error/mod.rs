//! Error types and result aliases for gemsync operations.
//!
//! Every failure a remote call, a config load or the pipeline can produce is a
//! [`SyncError`]. The retry layer logs [`SyncError::category`] next to the message, so
//! categories are stable snake_case names.

use thiserror::Error;

/// Unified error type for all gemsync operations
#[derive(Error, Debug)]
pub enum SyncError {
    // Remote errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{method} {url} returned HTTP {status}")]
    HttpStatus {
        method: String,
        url: String,
        status: u16,
    },

    #[error("Failed to decode {what}: {message}")]
    Decode { what: String, message: String },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // Config errors
    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    #[error("Failed to parse {path}: {message} at line {line}, column {column}")]
    TomlParse {
        path: String,
        message: String,
        line: usize,
        column: usize,
    },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Result type alias for gemsync operations
pub type SyncResult<T> = Result<T, SyncError>;

impl SyncError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Short, stable name of the error class, used as the `error_category` log field
    pub fn category(&self) -> &'static str {
        match self {
            SyncError::Network { .. } => "network",
            SyncError::HttpStatus { .. } => "http_status",
            SyncError::Decode { .. } => "decode",
            SyncError::InvalidUrl { .. } => "invalid_url",
            SyncError::ConfigValidation { .. } => "config_validation",
            SyncError::TomlParse { .. } => "toml_parse",
            SyncError::Io { .. } => "io",
            SyncError::Internal { .. } => "internal",
        }
    }

    /// Whether a later attempt could plausibly succeed: transport errors, throttling and
    /// server-side statuses. Reported next to retry warnings; every failure is still retried.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SyncError::Network { .. } | SyncError::Io { .. } => true,
            SyncError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            SyncError::Network { .. } => Some("Check your internet connection and try again"),
            SyncError::HttpStatus { status, .. } if *status == 401 || *status == 403 => {
                Some("Check that the API key is valid for the sink API")
            }
            SyncError::HttpStatus { .. } => {
                Some("The remote API rejected the request; retry later")
            }
            SyncError::InvalidUrl { .. } => {
                Some("Pass an absolute http(s) URL, e.g. https://bestgems.org")
            }
            SyncError::ConfigValidation { .. } | SyncError::TomlParse { .. } => {
                Some("Fix the value in gemsync.toml, the GEMSYNC_* environment or the command line")
            }
            _ => None,
        }
    }
}
