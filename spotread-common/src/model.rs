//! Book model shared by the importer and the reader daemon
//!
//! A book is a flat chapter list; a chapter is a dense, ordered paragraph
//! list of whitespace-normalized plain text. Identity is content-derived so
//! re-importing the same source file lands on the same ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hex length of content-hash ids (truncated SHA-256)
const ID_LEN: usize = 16;

/// Author used when the source carries no creator metadata
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// A parsed book
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// Content-derived id (stable across re-imports)
    pub id: String,
    pub title: String,
    pub author: String,
    /// Optional publisher from source metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    pub chapters: Vec<Chapter>,
}

/// One chapter of a book
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub paragraphs: Vec<Paragraph>,
}

/// One paragraph of normalized plain text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paragraph {
    pub content: String,
    /// Zero-based position within the chapter (dense, ascending)
    pub order_index: usize,
}

/// Library-listing view of a book
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSummary {
    pub id: String,
    pub title: String,
    pub author: String,
    pub chapter_count: usize,
    pub paragraph_count: usize,
}

/// On-disk book document (`<library>/<book-id>/book.json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookDocument {
    pub book: Book,
    pub imported_at: DateTime<Utc>,
    /// Source file name the book was imported from
    pub source: String,
}

/// Normalize paragraph text: NBSP and tabs become spaces, whitespace runs
/// collapse to one space, ends trimmed.
pub fn normalize_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_space = true;
    for c in s.chars() {
        let c = if c == '\u{a0}' { ' ' } else { c };
        if c.is_whitespace() {
            if !last_space {
                out.push(' ');
                last_space = true;
            }
        } else {
            out.push(c);
            last_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex[..ID_LEN].to_string()
}

/// Stable id for a paragraph, derived from its content
pub fn paragraph_id(content: &str) -> String {
    format!("p-{}", short_hash(content))
}

/// Stable id for a book, derived from title, author, and chapter titles
pub fn book_id(title: &str, author: &str, chapter_titles: &[String]) -> String {
    let mut input = String::new();
    input.push_str(title);
    input.push('\u{1f}');
    input.push_str(author);
    for t in chapter_titles {
        input.push('\u{1f}');
        input.push_str(t);
    }
    format!("b-{}", short_hash(&input))
}

impl Book {
    /// Assemble a book from parsed parts, computing its content id
    pub fn assemble(
        title: String,
        author: String,
        publisher: Option<String>,
        chapters: Vec<Chapter>,
    ) -> Self {
        let titles: Vec<String> = chapters.iter().map(|c| c.title.clone()).collect();
        let id = book_id(&title, &author, &titles);
        Self {
            id,
            title,
            author,
            publisher,
            chapters,
        }
    }

    /// Total paragraph count across all chapters
    pub fn paragraph_count(&self) -> usize {
        self.chapters.iter().map(|c| c.paragraphs.len()).sum()
    }

    /// Paragraph lookup by (chapter, paragraph) index
    pub fn paragraph(&self, chapter_index: usize, paragraph_index: usize) -> Option<&Paragraph> {
        self.chapters
            .get(chapter_index)
            .and_then(|c| c.paragraphs.get(paragraph_index))
    }

    /// Library-listing view
    pub fn summary(&self) -> BookSummary {
        BookSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            author: self.author.clone(),
            chapter_count: self.chapters.len(),
            paragraph_count: self.paragraph_count(),
        }
    }
}

impl Chapter {
    /// Build a chapter from raw paragraph texts, normalizing and dropping
    /// empties while keeping order_index dense
    pub fn from_texts(title: String, texts: impl IntoIterator<Item = String>) -> Self {
        let mut paragraphs = Vec::new();
        for text in texts {
            let content = normalize_text(&text);
            if content.is_empty() {
                continue;
            }
            paragraphs.push(Paragraph {
                content,
                order_index: paragraphs.len(),
            });
        }
        Self { title, paragraphs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text_collapses_whitespace() {
        assert_eq!(normalize_text("  a \t b\u{a0}c  "), "a b c");
        assert_eq!(normalize_text("line\none"), "line one");
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn test_paragraph_id_stable_and_distinct() {
        assert_eq!(paragraph_id("hello"), paragraph_id("hello"));
        assert_ne!(paragraph_id("hello"), paragraph_id("world"));
        assert!(paragraph_id("hello").starts_with("p-"));
    }

    #[test]
    fn test_book_id_depends_on_chapter_titles() {
        let a = book_id("T", "A", &["One".to_string()]);
        let b = book_id("T", "A", &["Two".to_string()]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_chapter_from_texts_drops_empties_dense_order() {
        let ch = Chapter::from_texts(
            "C".to_string(),
            vec!["first".to_string(), "   ".to_string(), "second".to_string()],
        );
        assert_eq!(ch.paragraphs.len(), 2);
        assert_eq!(ch.paragraphs[0].order_index, 0);
        assert_eq!(ch.paragraphs[1].order_index, 1);
        assert_eq!(ch.paragraphs[1].content, "second");
    }

    #[test]
    fn test_assemble_stable_id() {
        let chapters = vec![Chapter::from_texts(
            "One".to_string(),
            vec!["text".to_string()],
        )];
        let a = Book::assemble("T".into(), "A".into(), None, chapters.clone());
        let b = Book::assemble("T".into(), "A".into(), None, chapters);
        assert_eq!(a.id, b.id);
        assert_eq!(a.paragraph_count(), 1);
        assert!(a.paragraph(0, 0).is_some());
        assert!(a.paragraph(0, 1).is_none());
        assert!(a.paragraph(1, 0).is_none());
    }
}
