//! Crate-level error types

use thiserror::Error;

use crate::config::ConfigError;
use crate::registration::SessionError;

/// Errors raised by the relay server and its signaling path
#[derive(Debug, Error)]
pub enum RelayError {
    /// A text frame was not valid JSON or lacked a string `type`
    #[error("Malformed signaling message: {0}")]
    MalformedMessage(#[from] serde_json::Error),

    /// Environment configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Session signing setup failed
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Socket bind or serve failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for relay operations
pub type RelayResult<T> = Result<T, RelayError>;
