//! Error types for vosadmin

use crate::credit::CreditError;
use thiserror::Error;

/// Result type alias using vosadmin's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Marker every optimistic-concurrency rejection carries in its message.
pub const CONFLICT_MARKER: &str = "CONFLICT_ERROR";

/// vosadmin error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Server '{name}' not found in config.")]
    ServerNotFound { name: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("{message}")]
    Rejected { message: String },

    #[error("CONFLICT_ERROR: {message}")]
    Conflict {
        message: String,
        current_hash: Option<String>,
    },

    #[error("VOS API error on {server}: {message}")]
    Vos { server: String, message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Backend error (HTTP {status}): {detail}")]
    Backend { status: u16, detail: String },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Prompt failed: {message}")]
    Prompt { message: String },

    #[error(transparent)]
    Credit(#[from] CreditError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound {
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Error::Rejected {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>, current_hash: Option<String>) -> Self {
        Error::Conflict {
            message: message.into(),
            current_hash,
        }
    }

    /// True for stale-hash rejections, the case an operator resolves by reloading.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }
}
