//! Import pipeline
//!
//! Routes a source file to the right parser by extension, then writes the
//! resulting book document into the library folder. Writes are atomic
//! (temp file + rename) so the reader daemon never observes a half-written
//! book.

use crate::error::{Error, Result};
use crate::{epub, markdown};
use spotread_common::library;
use spotread_common::model::{BookDocument, BookSummary};
use spotread_common::time;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Supported source formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Epub,
    Markdown,
}

/// Result of importing one file
#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub book_id: String,
    pub title: String,
    pub author: String,
    pub chapter_count: usize,
    pub paragraph_count: usize,
    pub output_path: PathBuf,
}

/// Determine the source format from the file extension
pub fn detect_format(path: &Path) -> Result<SourceFormat> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "epub" => Ok(SourceFormat::Epub),
        "md" | "markdown" | "txt" => Ok(SourceFormat::Markdown),
        other => Err(Error::UnsupportedFormat(format!(
            "{} ({})",
            path.display(),
            if other.is_empty() { "no extension" } else { other }
        ))),
    }
}

/// Import one book file into the library
pub fn import_file(path: &Path, library_root: &Path) -> Result<ImportSummary> {
    let format = detect_format(path)?;
    let file_stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "book".to_string());

    let book = match format {
        SourceFormat::Epub => epub::parse_epub(path)?,
        SourceFormat::Markdown => {
            let raw = fs::read_to_string(path)?;
            markdown::parse_markdown(&raw, &file_stem)?
        }
    };

    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let document = BookDocument {
        book,
        imported_at: time::now(),
        source,
    };
    let output_path = write_book_document(library_root, &document)?;

    let summary = ImportSummary {
        book_id: document.book.id.clone(),
        title: document.book.title.clone(),
        author: document.book.author.clone(),
        chapter_count: document.book.chapters.len(),
        paragraph_count: document.book.paragraph_count(),
        output_path,
    };
    info!(
        book_id = %summary.book_id,
        title = %summary.title,
        chapters = summary.chapter_count,
        paragraphs = summary.paragraph_count,
        "imported book"
    );
    Ok(summary)
}

/// Write a book document to `<library>/<book-id>/book.json` atomically
fn write_book_document(library_root: &Path, document: &BookDocument) -> Result<PathBuf> {
    let book_dir = library_root.join(&document.book.id);
    fs::create_dir_all(&book_dir)?;

    let final_path = library::book_path(library_root, &document.book.id);
    let tmp_path = book_dir.join("book.json.tmp");

    let json = serde_json::to_vec_pretty(document)?;
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, &final_path)?;
    Ok(final_path)
}

/// List all books in the library folder
pub fn list_books(library_root: &Path) -> Result<Vec<BookSummary>> {
    Ok(library::scan_library(library_root)?)
}

/// Read one book document from disk
pub fn read_book_document(path: &Path) -> Result<BookDocument> {
    Ok(library::read_book_document(path)?)
}
