//! Error types for the Tollgate service.

use std::time::Duration;
use thiserror::Error;

/// Main error type for Tollgate operations.
#[derive(Error, Debug)]
pub enum TollgateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The window length is zero or cannot be expressed as a wall-clock offset
    #[error("Invalid interval {0:?}: the window length must be a positive duration")]
    InvalidInterval(Duration),

    /// A rate limit header is missing or does not hold a number
    #[error("Malformed rate limit header {name}: {reason}")]
    Header {
        /// Name of the offending header
        name: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for TollgateError {
    fn from(e: config::ConfigError) -> Self {
        TollgateError::Config(e.to_string())
    }
}

/// Result type alias for Tollgate operations.
pub type Result<T> = std::result::Result<T, TollgateError>;
