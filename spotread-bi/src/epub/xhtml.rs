//! Lenient XHTML text extraction
//!
//! Chapter segments produced by fragment-anchor slicing are rarely
//! well-formed documents (unclosed wrappers, missing roots), so paragraph
//! extraction runs on a forgiving tag scanner instead of a strict XML
//! reader. Scripts, styles, and comments are dropped wholesale; `<br>`
//! becomes a newline; block elements break text.

use spotread_common::model::normalize_text;

/// One scanner event over raw markup
#[derive(Debug, PartialEq)]
enum Piece<'a> {
    Text(&'a str),
    Open(String),
    Close(String),
    SelfClose(String),
}

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "li", "ul", "ol", "blockquote", "tr", "table", "h1", "h2",
    "h3", "h4", "h5", "h6",
];

fn is_block(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag)
}

/// Byte offset of an ASCII needle, case-insensitively
fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || h.len() < n.len() {
        return None;
    }
    (0..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}

/// Scan markup into text/tag pieces, skipping comments, doctypes,
/// processing instructions, and the full content of script/style elements.
fn pieces(html: &str) -> Vec<Piece<'_>> {
    let bytes = html.as_bytes();
    let mut out = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        match html[pos..].find('<') {
            None => {
                out.push(Piece::Text(&html[pos..]));
                break;
            }
            Some(rel) => {
                let lt = pos + rel;
                if lt > pos {
                    out.push(Piece::Text(&html[pos..lt]));
                }

                let rest = &html[lt..];
                if rest.starts_with("<!--") {
                    // Comment: skip to -->
                    pos = match rest.find("-->") {
                        Some(end) => lt + end + 3,
                        None => bytes.len(),
                    };
                    continue;
                }
                if rest.starts_with("<!") || rest.starts_with("<?") {
                    // Doctype or processing instruction: skip to >
                    pos = match rest.find('>') {
                        Some(end) => lt + end + 1,
                        None => bytes.len(),
                    };
                    continue;
                }

                // Scan for the tag end, honoring quoted attribute values
                let mut quote: Option<char> = None;
                let mut tag_end = None;
                for (i, c) in rest.char_indices().skip(1) {
                    match quote {
                        Some(q) => {
                            if c == q {
                                quote = None;
                            }
                        }
                        None => {
                            if c == '"' || c == '\'' {
                                quote = Some(c);
                            } else if c == '>' {
                                tag_end = Some(i);
                                break;
                            }
                        }
                    }
                }
                let Some(end) = tag_end else {
                    // Truncated tag at end of segment: drop it
                    break;
                };

                let inner = &rest[1..end];
                let closing = inner.starts_with('/');
                let self_closing = inner.trim_end().ends_with('/');
                let name: String = inner
                    .trim_start_matches('/')
                    .chars()
                    .take_while(|c| c.is_ascii_alphanumeric())
                    .collect::<String>()
                    .to_lowercase();
                pos = lt + end + 1;

                if name.is_empty() {
                    continue;
                }

                if !closing && (name == "script" || name == "style") && !self_closing {
                    // Skip element content up to the matching close tag
                    let close_pat = format!("</{}", name);
                    match find_ascii_ci(&html[pos..], &close_pat) {
                        Some(idx) => {
                            let after = pos + idx;
                            pos = match html[after..].find('>') {
                                Some(gt) => after + gt + 1,
                                None => bytes.len(),
                            };
                        }
                        None => pos = bytes.len(),
                    }
                    continue;
                }

                if closing {
                    out.push(Piece::Close(name));
                } else if self_closing {
                    out.push(Piece::SelfClose(name));
                } else {
                    out.push(Piece::Open(name));
                }
            }
        }
    }
    out
}

/// Decode the entity references that matter for reading text
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices();
    while let Some((i, c)) = chars.next() {
        if c != '&' {
            out.push(c);
            continue;
        }
        let rest = &text[i..];
        // Entity bodies are short; search a bounded window of raw bytes
        // (';' is ASCII, so the offset is always a char boundary)
        let Some(semi) = rest.as_bytes().iter().take(12).position(|&b| b == b';') else {
            out.push('&');
            continue;
        };
        let entity = &rest[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{a0}'),
            _ => {
                if let Some(num) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                    u32::from_str_radix(num, 16).ok().and_then(char::from_u32)
                } else if let Some(num) = entity.strip_prefix('#') {
                    num.parse::<u32>().ok().and_then(char::from_u32)
                } else {
                    None
                }
            }
        };
        match decoded {
            Some(ch) => {
                out.push(ch);
                // Consume the entity body
                for _ in 0..semi {
                    chars.next();
                }
            }
            None => out.push('&'),
        }
    }
    out
}

/// Strip all markup, inserting newlines at block boundaries and `<br>`
pub fn strip_tags(html: &str) -> String {
    let mut out = String::new();
    for piece in pieces(html) {
        match piece {
            Piece::Text(t) => out.push_str(&decode_entities(t)),
            Piece::Open(name) | Piece::Close(name) | Piece::SelfClose(name) => {
                if name == "br" || is_block(&name) {
                    out.push('\n');
                }
            }
        }
    }
    out
}

/// Collect the text content of every `tag` element, outermost only
pub fn element_texts(html: &str, tag: &str) -> Vec<String> {
    collect_texts(html, &[tag])
}

/// Collect the text content of heading elements (h1-h6) in document order
pub fn headings(html: &str) -> Vec<String> {
    collect_texts(html, &["h1", "h2", "h3", "h4", "h5", "h6"])
}

/// Text of the document `<title>` element, if present
pub fn title_text(html: &str) -> Option<String> {
    collect_texts(html, &["title"]).into_iter().next().filter(|t| !t.is_empty())
}

fn collect_texts(html: &str, tags: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut buff = String::new();

    for piece in pieces(html) {
        match piece {
            Piece::Open(name) => {
                if tags.contains(&name.as_str()) {
                    if depth == 0 {
                        buff.clear();
                    }
                    depth += 1;
                } else if depth > 0 && name == "br" {
                    buff.push('\n');
                }
            }
            Piece::SelfClose(name) => {
                if depth > 0 && name == "br" {
                    buff.push('\n');
                }
            }
            Piece::Close(name) => {
                if tags.contains(&name.as_str()) && depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        out.push(normalize_text(&decode_entities(&buff)));
                    }
                }
            }
            Piece::Text(t) => {
                if depth > 0 {
                    buff.push_str(t);
                }
            }
        }
    }
    out
}

/// Extract reading paragraphs from markup
///
/// Preference order mirrors how real EPUB chapters are marked up:
/// `<p>` elements, then generic block containers, then a flat-text split on
/// blank lines and sentence boundaries.
pub fn extract_paragraphs(html: &str) -> Vec<String> {
    let ps: Vec<String> = element_texts(html, "p")
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();
    if !ps.is_empty() {
        return ps;
    }

    let blocks: Vec<String> = collect_texts(html, &["div", "section", "article", "li"])
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();
    if !blocks.is_empty() {
        return blocks;
    }

    // Flat text: blank-line blocks, then sentence boundaries
    let text = strip_tags(html);
    let mut out = Vec::new();
    for block in text.split("\n\n") {
        let trimmed = block.trim();
        if trimmed.is_empty() {
            continue;
        }
        for sentence in crate::markdown::split_sentences(trimmed) {
            if !sentence.is_empty() {
                out.push(sentence);
            }
        }
    }
    out
}
