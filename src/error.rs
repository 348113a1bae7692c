//! Unified error handling for the fanout crate
//!
//! Remote behavior (probe failures, rejected dispatches, unreachable
//! services) never surfaces here: it is recorded as an outcome in the
//! [`RunReport`](crate::models::RunReport). This type covers the boundary
//! and ambient failures only: bad configuration, malformed input, and
//! local I/O.
//!
//! # Usage
//!
//! ```rust,ignore
//! use fanout::error::{Error, ErrorCategory};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         println!("Retrying: {err}");
//!     } else if err.category() == ErrorCategory::Input {
//!         eprintln!("Bad request: {err}");
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Configuration and validation errors
    Config,
    /// Malformed caller input
    Input,
    /// HTTP client or server errors
    Network,
    /// Local I/O errors
    Io,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Input => "input",
            Self::Network => "network",
            Self::Io => "io",
            Self::Other => "other",
        }
    }
}

/// Unified error type for the fanout crate
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Caller supplied malformed input (e.g. missing text)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Status probe requested for a service that is not configured
    #[error("Unknown service: {0}")]
    UnknownService(String),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server bind/serve errors
    #[error("Server error: {0}")]
    Server(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TOML parse errors
    #[error("TOML error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Io(_) => true, // I/O errors are often transient
            Self::Server(_) => true,
            Self::Config(_)
            | Self::InvalidInput(_)
            | Self::UnknownService(_)
            | Self::TomlDe(_)
            | Self::TomlSer(_)
            | Self::Json(_) => false,
        }
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) | Self::TomlDe(_) | Self::TomlSer(_) => ErrorCategory::Config,
            Self::InvalidInput(_) | Self::UnknownService(_) | Self::Json(_) => {
                ErrorCategory::Input
            }
            Self::Http(_) | Self::Server(_) => ErrorCategory::Network,
            Self::Io(_) => ErrorCategory::Io,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
