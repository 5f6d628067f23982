//! Table-of-contents parsing (EPUB3 nav and EPUB2 NCX)
//!
//! Both parsers flatten the navigation tree into entries in document order;
//! nesting depth carries no meaning for chapter segmentation.

use super::resolve_href;
use crate::error::Result;
use crate::titles::collapse_ws;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;

/// One TOC entry pointing into a content document
#[derive(Debug, Clone, PartialEq)]
pub struct TocEntry {
    /// Archive path of the target document
    pub path: String,
    /// Fragment anchor within the document, if any
    pub fragment: Option<String>,
    /// Link title (whitespace-collapsed)
    pub title: String,
}

fn text_of(t: &BytesText<'_>) -> String {
    t.unescape()
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| String::from_utf8_lossy(t.as_ref()).into_owned())
}

fn attr_of(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes().flatten().find(|a| a.key.as_ref() == name).map(|a| {
        a.unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&a.value).into_owned())
    })
}

/// One `<nav>` block found in a navigation document
#[derive(Debug, Default)]
struct NavBlock {
    epub_type: Option<String>,
    role: Option<String>,
    id: Option<String>,
    entries: Vec<TocEntry>,
}

/// Parse an EPUB3 navigation document
///
/// Navs are ranked: `epub:type="toc"`, then `role="doc-toc"`, then
/// `id="toc"`, then the first nav in the document. Entries are every
/// `<a href>` inside the chosen nav, in document order.
pub fn parse_nav(xml: &str, base_dir: &str) -> Result<Vec<TocEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.check_end_names(false);

    let mut blocks: Vec<NavBlock> = Vec::new();
    let mut in_nav = false;
    // Open anchor: (href, accumulated text)
    let mut anchor: Option<(String, String)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().local_name().as_ref() {
                b"nav" => {
                    blocks.push(NavBlock {
                        epub_type: attr_of(&e, b"epub:type"),
                        role: attr_of(&e, b"role"),
                        id: attr_of(&e, b"id"),
                        entries: Vec::new(),
                    });
                    in_nav = true;
                }
                b"a" if in_nav => {
                    if let Some(href) = attr_of(&e, b"href") {
                        anchor = Some((href, String::new()));
                    }
                }
                _ => {}
            },
            Event::Text(t) => {
                if let Some((_, buff)) = anchor.as_mut() {
                    buff.push_str(&text_of(&t));
                    buff.push(' ');
                }
            }
            Event::End(e) => match e.name().local_name().as_ref() {
                b"nav" => in_nav = false,
                b"a" => {
                    if let (Some((href, text)), Some(block)) = (anchor.take(), blocks.last_mut()) {
                        let (path, fragment) = resolve_href(&href, base_dir);
                        block.entries.push(TocEntry {
                            path,
                            fragment,
                            title: collapse_ws(&text),
                        });
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    let chosen = blocks
        .iter()
        .position(|b| b.epub_type.as_deref().map(|t| t.contains("toc")).unwrap_or(false))
        .or_else(|| blocks.iter().position(|b| b.role.as_deref() == Some("doc-toc")))
        .or_else(|| blocks.iter().position(|b| b.id.as_deref() == Some("toc")))
        .or(if blocks.is_empty() { None } else { Some(0) });

    Ok(chosen
        .map(|i| std::mem::take(&mut blocks[i].entries))
        .unwrap_or_default())
}

/// Parse an EPUB2 NCX document
///
/// Walks the `navMap` pre-order: each `navPoint` contributes its
/// `navLabel` text and `content src`.
pub fn parse_ncx(xml: &str, base_dir: &str) -> Result<Vec<TocEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.check_end_names(false);

    let mut entries = Vec::new();
    let mut in_nav_map = false;
    let mut in_nav_label = false;
    // One label slot per open navPoint
    let mut labels: Vec<Option<String>> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().local_name().as_ref() {
                b"navMap" => in_nav_map = true,
                b"navPoint" if in_nav_map => labels.push(None),
                b"navLabel" if in_nav_map => in_nav_label = true,
                b"content" if in_nav_map => {
                    push_ncx_entry(&e, &labels, base_dir, &mut entries);
                }
                _ => {}
            },
            Event::Empty(e) => {
                if in_nav_map && e.name().local_name().as_ref() == b"content" {
                    push_ncx_entry(&e, &labels, base_dir, &mut entries);
                }
            }
            Event::Text(t) => {
                if in_nav_label {
                    if let Some(slot) = labels.last_mut() {
                        if slot.is_none() {
                            let text = collapse_ws(&text_of(&t));
                            if !text.is_empty() {
                                *slot = Some(text);
                            }
                        }
                    }
                }
            }
            Event::End(e) => match e.name().local_name().as_ref() {
                b"navMap" => in_nav_map = false,
                b"navLabel" => in_nav_label = false,
                b"navPoint" => {
                    labels.pop();
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(entries)
}

fn push_ncx_entry(
    e: &BytesStart<'_>,
    labels: &[Option<String>],
    base_dir: &str,
    entries: &mut Vec<TocEntry>,
) {
    let Some(src) = attr_of(e, b"src") else {
        return;
    };
    let (path, fragment) = resolve_href(&src, base_dir);
    let title = labels
        .last()
        .and_then(|l| l.clone())
        .unwrap_or_default();
    entries.push(TocEntry {
        path,
        fragment,
        title,
    });
}
