//! Error types for the dsman core library
//!
//! This module contains all error types used throughout the library, organized
//! into logical categories for better maintainability and clarity.

use thiserror::Error;

pub mod command;
pub mod config;
pub mod io;
pub mod remote;
pub mod validation;

pub use self::command::CommandError;
pub use self::config::ConfigError;
pub use self::io::{IoError, IoErrorKind};
pub use self::remote::RemoteError;
pub use self::validation::ValidationError;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the dsman core library
///
/// Errors are categorized into five main types:
/// - Configuration errors: missing or invalid site/layout configuration
/// - Validation errors: invalid or contradictory invocation parameters
/// - Command errors: failures of the wrapped `git` and `git-annex` binaries
/// - Remote errors: failures talking to a hosting site
/// - I/O errors: file system operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Validation related errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// External command errors
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Remote site errors
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// I/O related errors
    #[error(transparent)]
    Io(#[from] IoError),
}

impl Error {
    /// Whether this error stems from configuration or invocation rather than
    /// from the outside world
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Validation(_))
    }
}

// Conversions from external error types

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io(IoError::from_std(source))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Remote(RemoteError::from(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Io(IoError::corrupt_data(&err.to_string()))
    }
}
