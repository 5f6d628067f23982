//! EPUB import
//!
//! Turns an EPUB archive into the canonical book model. Chapter boundaries
//! come from the table of contents when one exists (EPUB3 nav, then EPUB2
//! NCX), segmented by fragment anchors; otherwise the spine is walked one
//! document per chapter.

pub mod container;
pub mod opf;
pub mod segment;
pub mod toc;
pub mod xhtml;

use crate::error::{Error, Result};
use crate::titles::{auto_chapter_title, short_title};
use container::EpubArchive;
use percent_encoding::percent_decode_str;
use segment::{segment_document, Anchor};
use spotread_common::model::{Book, Chapter, UNKNOWN_AUTHOR};
use std::path::Path;
use toc::TocEntry;
use tracing::{debug, info, warn};

/// Chapter cap for the spine fallback (a TOC is author-curated; a bare
/// spine on a malformed book can run to hundreds of fragments)
const SPINE_CHAPTER_CAP: usize = 50;

/// Title for the single-chapter last resort
const FALLBACK_CHAPTER_TITLE: &str = "Text";

/// Minimum mean paragraph length for a chapter to count as real text
const MIN_MEAN_PARAGRAPH_LEN: usize = 8;

/// Parse an EPUB file into a book
pub fn parse_epub(path: &Path) -> Result<Book> {
    let file_stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "book".to_string());

    let mut archive = EpubArchive::open(path)?;
    let opf_path = archive.rootfile_path()?;
    let opf_xml = archive
        .read_string(&opf_path)?
        .ok_or_else(|| Error::MissingResource(opf_path.clone()))?;
    let package = opf::parse_opf(&opf_xml)?;
    let opf_dir = parent_dir(&opf_path);

    let title = package
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(file_stem);
    let author = package
        .author
        .clone()
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

    let toc_entries = load_toc_entries(&mut archive, &package, &opf_dir)?;

    let mut chapters = if toc_entries.is_empty() {
        Vec::new()
    } else {
        chapters_from_toc(&mut archive, &toc_entries)?
    };

    if chapters.is_empty() {
        debug!("no usable TOC chapters, walking the spine");
        chapters = chapters_from_spine(&mut archive, &package, &opf_dir, &title)?;
    }

    if chapters.is_empty() {
        // Last resort: the first spine document as a single chapter
        chapters = single_chapter_fallback(&mut archive, &package, &opf_dir)?;
    }

    if chapters.is_empty() {
        return Err(Error::InvalidBook(format!(
            "no readable chapters in {}",
            path.display()
        )));
    }

    info!(
        title = %title,
        chapters = chapters.len(),
        "parsed EPUB"
    );
    Ok(Book::assemble(title, author, package.publisher.clone(), chapters))
}

/// Resolve an href against a base directory, splitting off the fragment
///
/// Hrefs are percent-decoded before resolution; `..` and `.` segments are
/// normalized away.
pub fn resolve_href(href: &str, base_dir: &str) -> (String, Option<String>) {
    let decoded = percent_decode_str(href).decode_utf8_lossy().into_owned();
    let (file, fragment) = match decoded.split_once('#') {
        Some((f, frag)) if !frag.is_empty() => (f.to_string(), Some(frag.to_string())),
        Some((f, _)) => (f.to_string(), None),
        None => (decoded, None),
    };
    (join_normalize(base_dir, &file), fragment)
}

/// Directory part of an archive path ("" for root members)
pub fn parent_dir(path: &str) -> String {
    match path.rfind('/') {
        Some(idx) => path[..idx].to_string(),
        None => String::new(),
    }
}

/// Join a relative archive path onto a base directory, resolving dot
/// segments
fn join_normalize(base_dir: &str, rel: &str) -> String {
    let mut parts: Vec<&str> = if base_dir.is_empty() {
        Vec::new()
    } else {
        base_dir.split('/').collect()
    };
    for seg in rel.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

fn is_content_doc(path: &str) -> bool {
    let lower = path.to_lowercase();
    lower.ends_with(".xhtml") || lower.ends_with(".html") || lower.ends_with(".htm")
}

/// Load TOC entries, preferring the EPUB3 nav document over the EPUB2 NCX
///
/// Entries pointing outside the archive or at non-document resources are
/// discarded here so segmentation only ever sees real chapter targets.
fn load_toc_entries(
    archive: &mut EpubArchive,
    package: &opf::PackageDoc,
    opf_dir: &str,
) -> Result<Vec<TocEntry>> {
    let mut entries = Vec::new();

    if let Some(nav) = package.nav_item() {
        let (nav_path, _) = resolve_href(&nav.href, opf_dir);
        if let Some(nav_xml) = archive.read_string(&nav_path)? {
            entries = toc::parse_nav(&nav_xml, &parent_dir(&nav_path))?;
            debug!(count = entries.len(), "parsed nav document");
        }
    }

    if entries.is_empty() {
        if let Some(ncx) = package.ncx_item() {
            let (ncx_path, _) = resolve_href(&ncx.href, opf_dir);
            if let Some(ncx_xml) = archive.read_string(&ncx_path)? {
                entries = toc::parse_ncx(&ncx_xml, &parent_dir(&ncx_path))?;
                debug!(count = entries.len(), "parsed NCX document");
            }
        }
    }

    entries.retain(|entry| {
        let keep = is_content_doc(&entry.path) && archive.contains(&entry.path);
        if !keep {
            warn!(path = %entry.path, "dropping TOC entry with unusable target");
        }
        keep
    });
    Ok(entries)
}

/// Build chapters from TOC entries via fragment-anchor segmentation
fn chapters_from_toc(archive: &mut EpubArchive, entries: &[TocEntry]) -> Result<Vec<Chapter>> {
    // Group by target document, preserving first-appearance order
    let mut order: Vec<&str> = Vec::new();
    for entry in entries {
        if !order.contains(&entry.path.as_str()) {
            order.push(&entry.path);
        }
    }

    let mut chapters = Vec::new();
    for doc_path in order {
        let Some(raw) = archive.read_string(doc_path)? else {
            continue;
        };
        let anchors: Vec<Anchor> = entries
            .iter()
            .filter(|e| e.path == doc_path)
            .map(|e| Anchor {
                title: e.title.clone(),
                fragment: e.fragment.clone(),
            })
            .collect();

        for seg in segment_document(&raw, &anchors) {
            let paragraphs = xhtml::extract_paragraphs(seg.markup);
            if paragraphs.is_empty() || paragraphs_look_invalid(&paragraphs) {
                debug!(title = %seg.title, "skipping empty or invalid segment");
                continue;
            }
            let chapter_title = if seg.title.is_empty() {
                format!("Chapter {}", chapters.len() + 1)
            } else {
                short_title(&seg.title)
            };
            chapters.push(Chapter::from_texts(chapter_title, paragraphs));
        }
    }
    Ok(chapters.into_iter().filter(|c| !c.paragraphs.is_empty()).collect())
}

/// Build chapters by walking spine documents, one chapter per document
fn chapters_from_spine(
    archive: &mut EpubArchive,
    package: &opf::PackageDoc,
    opf_dir: &str,
    book_title: &str,
) -> Result<Vec<Chapter>> {
    let mut chapters = Vec::new();
    for idref in &package.spine {
        let Some(item) = package.item_by_id(idref) else {
            continue;
        };
        let (doc_path, _) = resolve_href(&item.href, opf_dir);
        if !is_content_doc(&doc_path) {
            continue;
        }
        let Some(raw) = archive.read_string(&doc_path)? else {
            continue;
        };

        let paragraphs = xhtml::extract_paragraphs(&raw);
        if paragraphs.is_empty() || paragraphs_look_invalid(&paragraphs) {
            continue;
        }

        let stem = file_stem_of(&doc_path);
        let headings = xhtml::headings(&raw);
        let doc_title = xhtml::title_text(&raw);
        let chapter_title = short_title(&auto_chapter_title(
            &headings,
            doc_title.as_deref(),
            book_title,
            &stem,
        ));
        chapters.push(Chapter::from_texts(chapter_title, paragraphs));

        if chapters.len() >= SPINE_CHAPTER_CAP {
            warn!("spine chapter cap reached, truncating at {}", SPINE_CHAPTER_CAP);
            break;
        }
    }
    Ok(chapters)
}

/// Single-chapter fallback from the first spine document
fn single_chapter_fallback(
    archive: &mut EpubArchive,
    package: &opf::PackageDoc,
    opf_dir: &str,
) -> Result<Vec<Chapter>> {
    let Some(first) = package.spine.first().and_then(|id| package.item_by_id(id)) else {
        return Ok(Vec::new());
    };
    let (doc_path, _) = resolve_href(&first.href, opf_dir);
    let Some(raw) = archive.read_string(&doc_path)? else {
        return Ok(Vec::new());
    };
    let paragraphs = xhtml::extract_paragraphs(&raw);
    if paragraphs.is_empty() || paragraphs_look_invalid(&paragraphs) {
        return Ok(Vec::new());
    }
    let chapter = Chapter::from_texts(FALLBACK_CHAPTER_TITLE.to_string(), paragraphs);
    Ok(vec![chapter])
}

fn file_stem_of(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[..idx].to_string(),
        _ => name.to_string(),
    }
}

/// Screen out chapters whose "paragraphs" are XML error banners or
/// fragmentary noise rather than prose
fn paragraphs_look_invalid(paragraphs: &[String]) -> bool {
    if paragraphs.is_empty() {
        return true;
    }
    let joined = paragraphs.join(" ").to_lowercase();
    if joined.contains("this page contains the following errors")
        || joined.contains("invalid element name")
    {
        return true;
    }
    let total: usize = paragraphs.iter().map(|p| p.chars().count()).sum();
    total / paragraphs.len() < MIN_MEAN_PARAGRAPH_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_href_relative_and_fragment() {
        assert_eq!(
            resolve_href("text/ch01.xhtml#part2", "OEBPS"),
            ("OEBPS/text/ch01.xhtml".to_string(), Some("part2".to_string()))
        );
        assert_eq!(
            resolve_href("ch01.xhtml", ""),
            ("ch01.xhtml".to_string(), None)
        );
    }

    #[test]
    fn test_resolve_href_dot_segments() {
        assert_eq!(
            resolve_href("../images/x.xhtml", "OEBPS/text"),
            ("OEBPS/images/x.xhtml".to_string(), None)
        );
        assert_eq!(
            resolve_href("./a.xhtml", "OEBPS"),
            ("OEBPS/a.xhtml".to_string(), None)
        );
    }

    #[test]
    fn test_resolve_href_percent_decoding() {
        assert_eq!(
            resolve_href("my%20chapter.xhtml", ""),
            ("my chapter.xhtml".to_string(), None)
        );
    }

    #[test]
    fn test_resolve_href_empty_fragment() {
        assert_eq!(
            resolve_href("a.xhtml#", ""),
            ("a.xhtml".to_string(), None)
        );
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir("OEBPS/content.opf"), "OEBPS");
        assert_eq!(parent_dir("content.opf"), "");
        assert_eq!(parent_dir("a/b/c.xhtml"), "a/b");
    }

    #[test]
    fn test_file_stem_of() {
        assert_eq!(file_stem_of("text/ch01.xhtml"), "ch01");
        assert_eq!(file_stem_of("noext"), "noext");
    }

    #[test]
    fn test_paragraphs_look_invalid_error_banner() {
        let paragraphs = vec![
            "This page contains the following errors: line 12".to_string(),
            "Below is a rendering of the page up to the first error.".to_string(),
        ];
        assert!(paragraphs_look_invalid(&paragraphs));
    }

    #[test]
    fn test_paragraphs_look_invalid_short_fragments() {
        let short: Vec<String> = vec!["a".into(), "bb".into(), "ccc".into()];
        assert!(paragraphs_look_invalid(&short));

        let fine: Vec<String> = vec!["A real paragraph of text.".into()];
        assert!(!paragraphs_look_invalid(&fine));
    }
}
