//! End-to-end EPUB import tests
//!
//! Each test assembles a real EPUB archive on disk and runs it through the
//! import pipeline, checking chapter boundaries and paragraph text.

use std::io::Write;
use std::path::{Path, PathBuf};

use spotread_bi::pipeline;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const CONTAINER_XML: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

/// Write an EPUB archive from (member name, content) pairs
fn write_epub(path: &Path, members: &[(&str, &str)]) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    zip.start_file("mimetype", options).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();
    for (name, content) in members {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

fn opf(extra_manifest: &str, spine: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" xmlns:dc="http://purl.org/dc/elements/1.1/" version="3.0">
  <metadata>
    <dc:title>Riverbank Tales</dc:title>
    <dc:creator>K. Grahame</dc:creator>
  </metadata>
  <manifest>
    {extra_manifest}
  </manifest>
  <spine>
    {spine}
  </spine>
</package>"#
    )
}

fn import(dir: &tempfile::TempDir, epub_name: &str) -> (pipeline::ImportSummary, spotread_common::Book) {
    let library = dir.path().join("library");
    let summary = pipeline::import_file(&dir.path().join(epub_name), &library).unwrap();
    let document = pipeline::read_book_document(&summary.output_path).unwrap();
    (summary, document.book)
}

fn epub_path(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

#[test]
fn nav_toc_fragments_segment_one_document() {
    let dir = tempfile::tempdir().unwrap();

    let body = r#"<html><body>
<h1 id="c1">The River Bank</h1>
<p>The Mole had been working very hard all the morning.</p>
<p>Spring was moving in the air above.</p>
<h1 id="c2">The Open Road</h1>
<p>The Rat stood in the doorway of the Mole's burrow.</p>
</body></html>"#;

    let nav = r#"<html xmlns:epub="http://www.idpf.org/2007/ops"><body>
<nav epub:type="toc"><ol>
  <li><a href="text/book.xhtml#c1">The River Bank</a></li>
  <li><a href="text/book.xhtml#c2">The Open Road</a></li>
</ol></nav>
</body></html>"#;

    write_epub(
        &epub_path(&dir, "book.epub"),
        &[
            ("META-INF/container.xml", CONTAINER_XML),
            (
                "OEBPS/content.opf",
                &opf(
                    r#"<item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
                       <item id="b" href="text/book.xhtml" media-type="application/xhtml+xml"/>"#,
                    r#"<itemref idref="b"/>"#,
                ),
            ),
            ("OEBPS/nav.xhtml", nav),
            ("OEBPS/text/book.xhtml", body),
        ],
    );

    let (summary, book) = import(&dir, "book.epub");
    assert_eq!(summary.title, "Riverbank Tales");
    assert_eq!(summary.author, "K. Grahame");
    assert_eq!(book.chapters.len(), 2);

    assert_eq!(book.chapters[0].title, "The River Bank");
    assert_eq!(book.chapters[0].paragraphs.len(), 2);
    assert!(book.chapters[0].paragraphs[0]
        .content
        .starts_with("The Mole had been working"));

    assert_eq!(book.chapters[1].title, "The Open Road");
    assert_eq!(book.chapters[1].paragraphs.len(), 1);
    assert!(book.chapters[1].paragraphs[0].content.contains("Rat stood"));
}

#[test]
fn ncx_toc_used_when_no_nav() {
    let dir = tempfile::tempdir().unwrap();

    let ncx = r#"<?xml version="1.0"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/">
  <navMap>
    <navPoint id="n1"><navLabel><text>First</text></navLabel><content src="ch1.xhtml"/></navPoint>
    <navPoint id="n2"><navLabel><text>Second</text></navLabel><content src="ch2.xhtml"/></navPoint>
  </navMap>
</ncx>"#;

    write_epub(
        &epub_path(&dir, "ncx.epub"),
        &[
            ("META-INF/container.xml", CONTAINER_XML),
            (
                "OEBPS/content.opf",
                &opf(
                    r#"<item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
                       <item id="c1" href="ch1.xhtml" media-type="application/xhtml+xml"/>
                       <item id="c2" href="ch2.xhtml" media-type="application/xhtml+xml"/>"#,
                    r#"<itemref idref="c1"/><itemref idref="c2"/>"#,
                ),
            ),
            ("OEBPS/toc.ncx", ncx),
            ("OEBPS/ch1.xhtml", "<html><body><p>Chapter one text here.</p></body></html>"),
            ("OEBPS/ch2.xhtml", "<html><body><p>Chapter two text here.</p></body></html>"),
        ],
    );

    let (_, book) = import(&dir, "ncx.epub");
    assert_eq!(book.chapters.len(), 2);
    assert_eq!(book.chapters[0].title, "First");
    assert_eq!(book.chapters[1].title, "Second");
}

#[test]
fn spine_fallback_titles_from_headings() {
    let dir = tempfile::tempdir().unwrap();

    write_epub(
        &epub_path(&dir, "bare.epub"),
        &[
            ("META-INF/container.xml", CONTAINER_XML),
            (
                "OEBPS/content.opf",
                &opf(
                    r#"<item id="c1" href="ch1.xhtml" media-type="application/xhtml+xml"/>
                       <item id="c2" href="ch2.xhtml" media-type="application/xhtml+xml"/>"#,
                    r#"<itemref idref="c1"/><itemref idref="c2"/>"#,
                ),
            ),
            (
                "OEBPS/ch1.xhtml",
                r#"<html><head><title>Riverbank Tales</title></head><body>
<h1>The Wild Wood</h1><p>It was a cold still afternoon with a hard steely sky.</p></body></html>"#,
            ),
            (
                "OEBPS/ch2.xhtml",
                r#"<html><head><title>chapter-two</title></head><body>
<p>No heading in this one, but plenty of readable text.</p></body></html>"#,
            ),
        ],
    );

    let (_, book) = import(&dir, "bare.epub");
    assert_eq!(book.chapters.len(), 2);
    // Heading wins; the book-title heading would have been skipped
    assert_eq!(book.chapters[0].title, "The Wild Wood");
    // No heading: document <title> (differs from book title)
    assert_eq!(book.chapters[1].title, "chapter-two");
}

#[test]
fn linear_no_spine_entries_are_skipped() {
    let dir = tempfile::tempdir().unwrap();

    write_epub(
        &epub_path(&dir, "linear.epub"),
        &[
            ("META-INF/container.xml", CONTAINER_XML),
            (
                "OEBPS/content.opf",
                &opf(
                    r#"<item id="cover" href="cover.xhtml" media-type="application/xhtml+xml"/>
                       <item id="c1" href="ch1.xhtml" media-type="application/xhtml+xml"/>"#,
                    r#"<itemref idref="cover" linear="no"/><itemref idref="c1"/>"#,
                ),
            ),
            ("OEBPS/cover.xhtml", "<html><body><p>Cover art description page.</p></body></html>"),
            ("OEBPS/ch1.xhtml", "<html><body><p>Actual story text starts here.</p></body></html>"),
        ],
    );

    let (_, book) = import(&dir, "linear.epub");
    assert_eq!(book.chapters.len(), 1);
    assert!(book.chapters[0].paragraphs[0].content.contains("Actual story"));
}

#[test]
fn missing_container_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write_epub(
        &epub_path(&dir, "broken.epub"),
        &[("OEBPS/ch1.xhtml", "<p>orphan</p>")],
    );

    let library = dir.path().join("library");
    let result = pipeline::import_file(&dir.path().join("broken.epub"), &library);
    assert!(result.is_err());
}
