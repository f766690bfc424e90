//! Error types for the eye page turner library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A landmark trace line could not be decoded
    #[error("Trace decode error: {0}")]
    Trace(#[from] serde_json::Error),

    /// The landmark source could not produce a frame
    #[error("Landmark source error: {0}")]
    Source(String),

    /// The command sink rejected or failed to deliver a command
    #[error("Command sink error: {0}")]
    Sink(String),

    /// `X11` window system operation failed
    #[error("X11 error: {0}")]
    X11(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Application-specific error type (alias for main Error type)
pub type AppError = Error;

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
