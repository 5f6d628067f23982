//! Error types for spotread-bi
//!
//! Defines importer-specific error types using thiserror for clear error
//! propagation.

use thiserror::Error;

/// Main error type for the book importer
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// EPUB container (zip) errors
    #[error("EPUB container error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parse errors in package/navigation documents
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Book document serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input file extension not recognized
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A required archive member is missing
    #[error("Missing resource: {0}")]
    MissingResource(String),

    /// Source parsed but produced no usable book
    #[error("Invalid book: {0}")]
    InvalidBook(String),

    /// Other parse failures
    #[error("Parse error: {0}")]
    Parse(String),

    /// Shared library/model errors
    #[error(transparent)]
    Common(#[from] spotread_common::Error),
}

/// Convenience Result type using spotread-bi Error
pub type Result<T> = std::result::Result<T, Error>;
