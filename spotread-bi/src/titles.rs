//! Chapter title heuristics
//!
//! TOC titles arrive messy (runs of whitespace, opaque generated ids, whole
//! first paragraphs); spine-fallback chapters have no title at all and must
//! borrow one from the document's headings.

use once_cell::sync::Lazy;
use regex::Regex;

static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws regex"));
static OPAQUE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_\-]{10,}$").expect("opaque id regex"));
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,3}$").expect("number regex"));
static ROMAN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[IVXLCDM]+$").expect("roman regex"));

/// Maximum words kept in a shortened title
const MAX_TITLE_WORDS: usize = 12;

/// Maximum characters kept in a shortened title
const MAX_TITLE_CHARS: usize = 80;

/// Collapse whitespace in a title
pub fn collapse_ws(s: &str) -> String {
    WS_RE.replace_all(s.trim(), " ").into_owned()
}

/// Shorten a raw title for display and file naming
///
/// A single opaque 10+-char identifier token is truncated to 10 chars; the
/// title keeps at most 12 words and 80 characters.
pub fn short_title(raw: &str) -> String {
    let mut t = collapse_ws(raw);
    if t.is_empty() {
        return t;
    }
    if OPAQUE_ID_RE.is_match(&t) {
        t = t.chars().take(10).collect();
    }
    let words: Vec<&str> = t.split(' ').collect();
    if words.len() > MAX_TITLE_WORDS {
        t = words[..MAX_TITLE_WORDS].join(" ");
    }
    if t.chars().count() > MAX_TITLE_CHARS {
        t = t.chars().take(MAX_TITLE_CHARS).collect::<String>().trim_end().to_string();
    }
    t
}

/// Pick a chapter title for a spine document with no TOC entry
///
/// Preference order: first usable heading (joining a bare chapter number
/// with the following heading when one exists), the document `<title>`, the
/// file stem.
pub fn auto_chapter_title(
    headings: &[String],
    doc_title: Option<&str>,
    book_title: &str,
    file_stem: &str,
) -> String {
    let book_lower = book_title.trim().to_lowercase();
    let candidates: Vec<String> = headings
        .iter()
        .map(|h| collapse_ws(h))
        .filter(|h| !h.is_empty())
        .filter(|h| {
            let lower = h.to_lowercase();
            lower != book_lower && lower != "contents" && lower != "table of contents"
        })
        .collect();

    if let Some(first) = candidates.first() {
        if NUMBER_RE.is_match(first) || ROMAN_RE.is_match(first) {
            // Bare "3" or "IV": pull in the next heading as the actual name
            if let Some(second) = candidates.get(1) {
                if second.chars().count() > 2 {
                    return format!("{} {}", first, second);
                }
            }
        }
        return first.clone();
    }

    if let Some(doc_title) = doc_title {
        let t = collapse_ws(doc_title);
        if !t.is_empty() && t.to_lowercase() != book_lower {
            return t;
        }
    }

    file_stem.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_title_collapses_whitespace() {
        assert_eq!(short_title("  The   Wind\n in the Willows "), "The Wind in the Willows");
    }

    #[test]
    fn test_short_title_truncates_opaque_ids() {
        assert_eq!(short_title("chapter_000000123456"), "chapter_00");
        // Mixed text is left alone
        assert_eq!(short_title("chapter one"), "chapter one");
    }

    #[test]
    fn test_short_title_word_and_char_caps() {
        let long = (0..20).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let shortened = short_title(&long);
        assert_eq!(shortened.split(' ').count(), 12);

        let wide = "x".repeat(200);
        assert!(short_title(&wide).chars().count() <= 80);
    }

    #[test]
    fn test_auto_title_prefers_headings() {
        let headings = vec!["The River Bank".to_string()];
        assert_eq!(
            auto_chapter_title(&headings, None, "The Wind in the Willows", "ch01"),
            "The River Bank"
        );
    }

    #[test]
    fn test_auto_title_skips_book_title_and_contents() {
        let headings = vec![
            "The Wind in the Willows".to_string(),
            "Contents".to_string(),
            "The Open Road".to_string(),
        ];
        assert_eq!(
            auto_chapter_title(&headings, None, "The Wind in the Willows", "ch02"),
            "The Open Road"
        );
    }

    #[test]
    fn test_auto_title_joins_bare_number_with_name() {
        let headings = vec!["IV".to_string(), "Mr. Badger".to_string()];
        assert_eq!(auto_chapter_title(&headings, None, "Book", "ch04"), "IV Mr. Badger");

        // A lone number with no follow-up stays as-is
        let headings = vec!["7".to_string()];
        assert_eq!(auto_chapter_title(&headings, None, "Book", "ch07"), "7");
    }

    #[test]
    fn test_auto_title_falls_back_to_doc_title_then_stem() {
        assert_eq!(
            auto_chapter_title(&[], Some("The Wild Wood"), "Book", "ch03"),
            "The Wild Wood"
        );
        assert_eq!(auto_chapter_title(&[], Some("Book"), "Book", "ch03"), "ch03");
        assert_eq!(auto_chapter_title(&[], None, "Book", "ch03"), "ch03");
    }
}
