//! EPUB zip container access
//!
//! Wraps the archive and resolves `META-INF/container.xml` to the package
//! document path.

use crate::error::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

/// An opened EPUB archive
pub struct EpubArchive {
    zip: ZipArchive<BufReader<File>>,
    names: HashSet<String>,
}

impl EpubArchive {
    /// Open an EPUB file
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let zip = ZipArchive::new(BufReader::new(file))?;
        let names = zip.file_names().map(|n| n.to_string()).collect();
        Ok(Self { zip, names })
    }

    /// Whether the archive contains a member with this exact name
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Read a member as UTF-8 text; `None` when the member is absent
    pub fn read_string(&mut self, name: &str) -> Result<Option<String>> {
        match self.zip.by_name(name) {
            Ok(mut member) => {
                let mut raw = Vec::new();
                member.read_to_end(&mut raw)?;
                Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
            }
            Err(ZipError::FileNotFound) => {
                debug!(member = name, "archive member not found");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Locate the OPF package document via META-INF/container.xml
    pub fn rootfile_path(&mut self) -> Result<String> {
        let container = self
            .read_string("META-INF/container.xml")?
            .ok_or_else(|| Error::MissingResource("META-INF/container.xml".to_string()))?;

        parse_rootfile(&container)?
            .ok_or_else(|| Error::MissingResource("container.xml rootfile".to_string()))
    }
}

/// Pull the first `rootfile` full-path out of container.xml
fn parse_rootfile(xml: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                if e.name().local_name().as_ref() == b"rootfile" {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"full-path" {
                            let value = attr
                                .unescape_value()
                                .map(|v| v.into_owned())
                                .unwrap_or_else(|_| {
                                    String::from_utf8_lossy(&attr.value).into_owned()
                                });
                            return Ok(Some(value));
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

    #[test]
    fn test_parse_rootfile() {
        assert_eq!(
            parse_rootfile(CONTAINER).unwrap(),
            Some("OEBPS/content.opf".to_string())
        );
    }

    #[test]
    fn test_parse_rootfile_missing() {
        assert_eq!(parse_rootfile("<container/>").unwrap(), None);
    }
}
