//! Markdown book parser
//!
//! Books authored (or exported) as Markdown use a simple chapter grammar:
//! optional `---` front matter carrying `title:`/`author:` keys, then ATX
//! headings delimiting chapters. This is deliberately a line scanner rather
//! than a CommonMark renderer: the grammar is fixed and inline markup is
//! kept verbatim as reading text.

use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use spotread_common::model::{normalize_text, Book, Chapter, UNKNOWN_AUTHOR};

static FRONT_MATTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A---\n.*?\n---\n?").expect("front matter regex"));
static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\btitle:[ \t]*([^\n]+)").expect("title regex"));
static AUTHOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bauthor:[ \t]*([^\n]+)").expect("author regex"));
static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.*)$").expect("heading regex"));

/// Title used for content that precedes any heading
pub const DEFAULT_CHAPTER_TITLE: &str = "Text";

/// Parse a Markdown book from its raw text
///
/// `fallback_title` (typically the file stem) is used when the front matter
/// has no title.
pub fn parse_markdown(raw: &str, fallback_title: &str) -> Result<Book> {
    let mut title = fallback_title.to_string();
    let mut author: Option<String> = None;

    let body = if let Some(fm) = FRONT_MATTER_RE.find(raw) {
        let fm_text = fm.as_str();
        if let Some(cap) = TITLE_RE.captures(fm_text) {
            title = cap[1].trim().to_string();
        }
        if let Some(cap) = AUTHOR_RE.captures(fm_text) {
            author = Some(cap[1].trim().to_string());
        }
        &raw[fm.end()..]
    } else {
        raw
    };

    // Split into (title, raw lines) chapters on ATX headings
    let mut raw_chapters: Vec<(String, Vec<&str>)> = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;
    for line in body.lines() {
        if let Some(cap) = HEADING_RE.captures(line) {
            if let Some(done) = current.take() {
                raw_chapters.push(done);
            }
            current = Some((normalize_text(&cap[2]), Vec::new()));
        } else {
            current
                .get_or_insert_with(|| (DEFAULT_CHAPTER_TITLE.to_string(), Vec::new()))
                .1
                .push(line);
        }
    }
    if let Some(done) = current.take() {
        raw_chapters.push(done);
    }

    let mut chapters: Vec<Chapter> = raw_chapters
        .into_iter()
        .enumerate()
        .map(|(i, (heading, lines))| {
            let chapter_title = if heading.is_empty() {
                format!("Chapter {}", i + 1)
            } else {
                heading
            };
            Chapter::from_texts(chapter_title, split_paragraph_blocks(&lines.join("\n")))
        })
        .filter(|c| !c.paragraphs.is_empty())
        .collect();

    if chapters.is_empty() {
        let fallback = Chapter::from_texts(
            DEFAULT_CHAPTER_TITLE.to_string(),
            split_paragraph_blocks(body),
        );
        if !fallback.paragraphs.is_empty() {
            chapters.push(fallback);
        }
    }

    let final_title = if title.trim().is_empty() {
        fallback_title.to_string()
    } else {
        title
    };
    Ok(Book::assemble(
        final_title,
        author.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
        None,
        chapters,
    ))
}

/// Split chapter text into paragraph blocks
///
/// Blank lines delimit paragraphs. When no block survives normalization,
/// sentence-boundary splitting is the last resort.
pub fn split_paragraph_blocks(text: &str) -> Vec<String> {
    let blocks: Vec<String> = text
        .split("\n\n")
        .flat_map(|b| {
            // Collapse runs of blank lines: skip empty leftovers
            let t = b.trim();
            if t.is_empty() {
                None
            } else {
                Some(normalize_text(t))
            }
        })
        .filter(|b| !b.is_empty())
        .collect();

    if !blocks.is_empty() {
        return blocks;
    }
    split_sentences(text)
}

fn is_sentence_end(c: char) -> bool {
    matches!(c, '。' | '！' | '？' | '.' | '!' | '?')
}

/// Split text after sentence-final punctuation followed by whitespace
pub(crate) fn split_sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut buff = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        buff.push(c);
        if is_sentence_end(c) && chars.peek().map(|n| n.is_whitespace()).unwrap_or(false) {
            let s = normalize_text(&buff);
            if !s.is_empty() {
                out.push(s);
            }
            buff.clear();
        }
    }
    let s = normalize_text(&buff);
    if !s.is_empty() {
        out.push(s);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_front_matter_title_and_author() {
        let raw = "---\ntitle: The Wind in the Willows\nauthor: Kenneth Grahame\n---\n# One\n\nHello there.\n";
        let book = parse_markdown(raw, "fallback").unwrap();
        assert_eq!(book.title, "The Wind in the Willows");
        assert_eq!(book.author, "Kenneth Grahame");
        assert_eq!(book.chapters.len(), 1);
        assert_eq!(book.chapters[0].title, "One");
    }

    #[test]
    fn test_no_front_matter_uses_fallback_title() {
        let book = parse_markdown("# One\n\npara\n", "my-book").unwrap();
        assert_eq!(book.title, "my-book");
        assert_eq!(book.author, UNKNOWN_AUTHOR);
    }

    #[test]
    fn test_headings_split_chapters() {
        let raw = "# One\n\nfirst\n\n## Two\n\nsecond a\n\nsecond b\n";
        let book = parse_markdown(raw, "t").unwrap();
        assert_eq!(book.chapters.len(), 2);
        assert_eq!(book.chapters[0].title, "One");
        assert_eq!(book.chapters[0].paragraphs.len(), 1);
        assert_eq!(book.chapters[1].title, "Two");
        assert_eq!(book.chapters[1].paragraphs.len(), 2);
        assert_eq!(book.chapters[1].paragraphs[1].content, "second b");
    }

    #[test]
    fn test_content_before_first_heading() {
        let raw = "intro paragraph\n\n# One\n\nbody\n";
        let book = parse_markdown(raw, "t").unwrap();
        assert_eq!(book.chapters[0].title, DEFAULT_CHAPTER_TITLE);
        assert_eq!(book.chapters[0].paragraphs[0].content, "intro paragraph");
    }

    #[test]
    fn test_headingless_body_is_single_chapter() {
        let raw = "only one\n\nand two\n";
        let book = parse_markdown(raw, "t").unwrap();
        assert_eq!(book.chapters.len(), 1);
        assert_eq!(book.chapters[0].title, DEFAULT_CHAPTER_TITLE);
        assert_eq!(book.chapters[0].paragraphs.len(), 2);
    }

    #[test]
    fn test_empty_chapters_are_dropped() {
        let raw = "# Empty\n\n# Full\n\ncontent\n";
        let book = parse_markdown(raw, "t").unwrap();
        assert_eq!(book.chapters.len(), 1);
        assert_eq!(book.chapters[0].title, "Full");
    }

    #[test]
    fn test_unbroken_text_stays_one_block() {
        // No blank lines: the whole text is a single paragraph block
        let blocks = split_paragraph_blocks("One. Two! Three?");
        assert_eq!(blocks, vec!["One. Two! Three?"]);
    }

    #[test]
    fn test_split_sentences_after_terminators() {
        assert_eq!(split_sentences("One. Two! Three?"), vec!["One.", "Two!", "Three?"]);
        // Terminator not followed by whitespace does not split (e.g. "3.5")
        assert_eq!(split_sentences("about 3.5 meters"), vec!["about 3.5 meters"]);
    }

    #[test]
    fn test_paragraph_blocks_normalize_whitespace() {
        let blocks = split_paragraph_blocks("a  line\nwrapped\n\nnext");
        assert_eq!(blocks, vec!["a line wrapped", "next"]);
    }

    #[test]
    fn test_split_sentences_cjk_terminators() {
        assert_eq!(split_sentences("你好。 世界！ 再见"), vec!["你好。", "世界！", "再见"]);
    }

    #[test]
    fn test_heading_with_empty_text_gets_numbered() {
        let raw = "#  \n\nbody\n";
        let book = parse_markdown(raw, "t").unwrap();
        assert_eq!(book.chapters[0].title, "Chapter 1");
    }
}
