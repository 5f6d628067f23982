//! Error types for spotread-rd
//!
//! Defines daemon-specific error types using thiserror for clear error
//! propagation.

use thiserror::Error;

/// Main error type for the reader daemon
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Command not valid in the current playback state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Shared library/model errors
    #[error(transparent)]
    Common(#[from] spotread_common::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using spotread-rd Error
pub type Result<T> = std::result::Result<T, Error>;
