//! OPF package document parsing
//!
//! Pulls book metadata, the manifest (id → href map), and the linear spine
//! out of the package document.

use crate::error::Result;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// One manifest item
#[derive(Debug, Clone)]
pub struct ManifestItem {
    pub id: String,
    pub href: String,
    pub media_type: String,
    pub properties: String,
}

/// Parsed package document
#[derive(Debug, Clone, Default)]
pub struct PackageDoc {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub manifest: Vec<ManifestItem>,
    /// Spine idrefs in reading order, `linear="no"` entries skipped
    pub spine: Vec<String>,
}

impl PackageDoc {
    /// Manifest lookup by id
    pub fn item_by_id(&self, id: &str) -> Option<&ManifestItem> {
        self.manifest.iter().find(|item| item.id == id)
    }

    /// EPUB3 navigation document (manifest properties contain "nav")
    pub fn nav_item(&self) -> Option<&ManifestItem> {
        self.manifest
            .iter()
            .find(|item| item.properties.split_whitespace().any(|p| p == "nav"))
    }

    /// EPUB2 NCX document
    pub fn ncx_item(&self) -> Option<&ManifestItem> {
        self.manifest
            .iter()
            .find(|item| item.media_type == "application/x-dtbncx+xml")
    }
}

/// Which metadata element's text we are currently capturing
#[derive(Debug, Clone, Copy, PartialEq)]
enum Capture {
    None,
    Title,
    Creator,
    Publisher,
}

fn attr_value(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes().flatten().find(|a| a.key.as_ref() == name).map(|a| {
        a.unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&a.value).into_owned())
    })
}

/// Parse an OPF package document
pub fn parse_opf(xml: &str) -> Result<PackageDoc> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut doc = PackageDoc::default();
    let mut in_metadata = false;
    let mut capture = Capture::None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().local_name().as_ref() {
                b"metadata" => in_metadata = true,
                b"title" if in_metadata && doc.title.is_none() => capture = Capture::Title,
                b"creator" if in_metadata && doc.author.is_none() => capture = Capture::Creator,
                b"publisher" if in_metadata && doc.publisher.is_none() => {
                    capture = Capture::Publisher
                }
                b"item" => push_item(&mut doc, &e),
                b"itemref" => push_itemref(&mut doc, &e),
                _ => {}
            },
            Event::Empty(e) => match e.name().local_name().as_ref() {
                b"item" => push_item(&mut doc, &e),
                b"itemref" => push_itemref(&mut doc, &e),
                _ => {}
            },
            Event::Text(t) => {
                if capture != Capture::None {
                    let text = t
                        .unescape()
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(t.as_ref()).into_owned());
                    let text = text.trim().to_string();
                    if !text.is_empty() {
                        match capture {
                            Capture::Title => doc.title = Some(text),
                            Capture::Creator => doc.author = Some(text),
                            Capture::Publisher => doc.publisher = Some(text),
                            Capture::None => {}
                        }
                    }
                }
            }
            Event::End(e) => match e.name().local_name().as_ref() {
                b"metadata" => in_metadata = false,
                b"title" | b"creator" | b"publisher" => capture = Capture::None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(doc)
}

fn push_item(doc: &mut PackageDoc, e: &BytesStart<'_>) {
    let id = attr_value(e, b"id");
    let href = attr_value(e, b"href");
    if let (Some(id), Some(href)) = (id, href) {
        doc.manifest.push(ManifestItem {
            id,
            href,
            media_type: attr_value(e, b"media-type").unwrap_or_default(),
            properties: attr_value(e, b"properties").unwrap_or_default(),
        });
    }
}

fn push_itemref(doc: &mut PackageDoc, e: &BytesStart<'_>) {
    let linear_no = attr_value(e, b"linear").map(|v| v == "no").unwrap_or(false);
    if linear_no {
        return;
    }
    if let Some(idref) = attr_value(e, b"idref") {
        doc.spine.push(idref);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPF: &str = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" xmlns:dc="http://purl.org/dc/elements/1.1/" version="3.0">
  <metadata>
    <dc:title>The Wind in the Willows</dc:title>
    <dc:creator>Kenneth Grahame</dc:creator>
    <dc:publisher>Project Example</dc:publisher>
  </metadata>
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    <item id="c1" href="text/ch01.xhtml" media-type="application/xhtml+xml"/>
    <item id="c2" href="text/ch02.xhtml" media-type="application/xhtml+xml"/>
    <item id="css" href="style.css" media-type="text/css"/>
  </manifest>
  <spine toc="ncx">
    <itemref idref="c1"/>
    <itemref idref="c2"/>
    <itemref idref="css" linear="no"/>
  </spine>
</package>"#;

    #[test]
    fn test_parse_metadata() {
        let doc = parse_opf(OPF).unwrap();
        assert_eq!(doc.title.as_deref(), Some("The Wind in the Willows"));
        assert_eq!(doc.author.as_deref(), Some("Kenneth Grahame"));
        assert_eq!(doc.publisher.as_deref(), Some("Project Example"));
    }

    #[test]
    fn test_manifest_and_spine() {
        let doc = parse_opf(OPF).unwrap();
        assert_eq!(doc.manifest.len(), 5);
        assert_eq!(doc.item_by_id("c1").unwrap().href, "text/ch01.xhtml");

        // linear="no" entries are skipped
        assert_eq!(doc.spine, vec!["c1", "c2"]);
    }

    #[test]
    fn test_toc_discovery() {
        let doc = parse_opf(OPF).unwrap();
        assert_eq!(doc.nav_item().unwrap().href, "nav.xhtml");
        assert_eq!(doc.ncx_item().unwrap().href, "toc.ncx");
    }

    #[test]
    fn test_first_creator_wins() {
        let xml = r#"<package><metadata>
            <dc:creator xmlns:dc="d">First Author</dc:creator>
            <dc:creator xmlns:dc="d">Second Author</dc:creator>
        </metadata></package>"#;
        let doc = parse_opf(xml).unwrap();
        assert_eq!(doc.author.as_deref(), Some("First Author"));
    }
}
