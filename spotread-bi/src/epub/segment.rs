//! TOC-driven chapter segmentation
//!
//! The heart of EPUB import: several TOC entries often point into the same
//! XHTML document via fragment anchors. Each anchor is located as a byte
//! offset in the raw markup, the offsets partition the document, and each
//! slice becomes one chapter.

use regex::Regex;

/// Attribute names that can carry a fragment anchor
const ANCHOR_ATTRS: [&str; 3] = ["id", "name", "xml:id"];

/// A chapter anchor within one document
#[derive(Debug, Clone)]
pub struct Anchor {
    pub title: String,
    pub fragment: Option<String>,
}

/// One segmented chapter: title plus its slice of raw markup
#[derive(Debug, Clone)]
pub struct Segment<'a> {
    pub title: String,
    pub markup: &'a str,
}

/// Locate a fragment anchor in raw markup
///
/// Searches for `id="frag"`, `name="frag"`, or `xml:id="frag"` (either
/// quote style, whitespace allowed around `=`) and backs up to the opening
/// `<` of the element carrying the attribute, so the anchor element itself
/// belongs to the chapter it starts.
pub fn fragment_offset(raw: &str, fragment: &str) -> Option<usize> {
    let escaped = regex::escape(fragment);
    for attr in ANCHOR_ATTRS {
        for quote in ['"', '\''] {
            let pattern = format!("{}{}{}{}{}", regex::escape(attr), r"\s*=\s*", quote, escaped, quote);
            // Patterns are built per fragment; compilation failures can't
            // happen with escaped input but are treated as no-match.
            let Ok(re) = Regex::new(&pattern) else {
                continue;
            };
            if let Some(m) = re.find(raw) {
                let start = m.start();
                return Some(raw[..start].rfind('<').unwrap_or(start));
            }
        }
    }
    None
}

/// Partition a document's raw markup by its anchors
///
/// Anchors without a fragment, or whose fragment cannot be found, fall to
/// offset 0. Anchors are ordered by offset (stable for ties) and each
/// segment runs to the next anchor's offset or the end of the document.
pub fn segment_document<'a>(raw: &'a str, anchors: &[Anchor]) -> Vec<Segment<'a>> {
    let mut positioned: Vec<(usize, &Anchor)> = anchors
        .iter()
        .map(|anchor| {
            let pos = anchor
                .fragment
                .as_deref()
                .and_then(|frag| fragment_offset(raw, frag))
                .unwrap_or(0);
            (pos, anchor)
        })
        .collect();
    positioned.sort_by_key(|(pos, _)| *pos);

    let mut segments = Vec::with_capacity(positioned.len());
    for (i, (start, anchor)) in positioned.iter().enumerate() {
        let end = positioned
            .get(i + 1)
            .map(|(next, _)| *next)
            .unwrap_or(raw.len());
        segments.push(Segment {
            title: anchor.title.clone(),
            markup: &raw[*start..end.max(*start)],
        });
    }
    segments
}
