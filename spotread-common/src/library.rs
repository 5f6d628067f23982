//! Library folder access
//!
//! The library is a plain folder of `<book-id>/book.json` documents written
//! by the importer and read by the reader daemon.

use crate::model::{BookDocument, BookSummary};
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// File name of a book document inside its book folder
pub const BOOK_FILE: &str = "book.json";

/// Path of a book's document within the library
pub fn book_path(library: &Path, book_id: &str) -> PathBuf {
    library.join(book_id).join(BOOK_FILE)
}

/// Read one book document from disk
pub fn read_book_document(path: &Path) -> Result<BookDocument> {
    let raw = fs::read(path)?;
    Ok(serde_json::from_slice(&raw)?)
}

/// Load a book document by id
///
/// Ids are validated against the content-hash alphabet so a request can
/// never escape the library folder.
pub fn load_book(library: &Path, book_id: &str) -> Result<BookDocument> {
    if book_id.is_empty()
        || !book_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(Error::InvalidInput(format!("invalid book id: {book_id}")));
    }
    let path = book_path(library, book_id);
    if !path.exists() {
        return Err(Error::NotFound(format!("book {book_id}")));
    }
    read_book_document(&path)
}

/// Scan the library for book summaries, sorted by title
///
/// Unreadable book documents are logged and skipped, never fatal.
pub fn scan_library(library: &Path) -> Result<Vec<BookSummary>> {
    let mut summaries = Vec::new();
    for entry in WalkDir::new(library)
        .min_depth(2)
        .max_depth(2)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if entry.file_name() != BOOK_FILE {
            continue;
        }
        match read_book_document(entry.path()) {
            Ok(document) => summaries.push(document.book.summary()),
            Err(e) => warn!(path = %entry.path().display(), "skipping unreadable book: {}", e),
        }
    }
    summaries.sort_by(|a, b| a.title.cmp(&b.title));
    Ok(summaries)
}
