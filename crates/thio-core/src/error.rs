//! Error types for THIO.
//!
//! Provider failures never reach the presentation layer: the router resolves
//! every [`ProviderError`] into a rule-based reply. Configuration problems are
//! reported through [`ConfigError`] when the config file is loaded.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single provider adapter call.
///
/// Rate limiting is deliberately absent from this enum; it is a successful
/// [`Generation::RateLimited`](crate::provider::Generation::RateLimited) outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Required credential or endpoint is missing. Raised before any network call.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Non-success HTTP status, or no response at all when `status` is `None`.
    #[error("Transport error{}: {message}", status_suffix(.status))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Success status, but the body could not be decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a Transport error for an HTTP status
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Creates a Transport error for a request that produced no response
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Creates an InvalidResponse error
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a Configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check if this is a Transport error
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// HTTP status carried by a Transport error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

/// Errors raised while loading [`ChatConfig`](crate::config::ChatConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Unknown provider '{0}' (expected one of: none, local, openai, gemini, ollama)")]
    UnknownProvider(String),

    #[error("Could not determine the platform config directory")]
    NoConfigDir,
}
