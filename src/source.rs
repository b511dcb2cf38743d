// Accepted XBRL-XML input
use crate::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;

const BOM: char = '\u{feff}';

/// Raw XBRL document that passed the boundary checks.
#[derive(Debug, Clone)]
pub struct XbrlFile {
    content: String,
    file_name: String,
    file_size: u64,
}

impl XbrlFile {
    /// Fails with `InvalidDocument` unless the root element is XBRL, with
    /// `EmptyFileName` on a blank name and `NonPositiveSize` on a zero size.
    pub fn new(content: impl Into<String>, file_name: impl Into<String>, file_size: u64) -> Result<Self> {
        let mut content = content.into();
        if content.starts_with(BOM) {
            content.drain(..BOM.len_utf8());
        }

        if !is_xbrl_doc(&content) {
            return Err(Error::InvalidDocument(
                "root element is not an XBRL instance".to_string(),
            ));
        }

        let file_name = file_name.into();
        if file_name.trim().is_empty() {
            return Err(Error::EmptyFileName);
        }

        if file_size == 0 {
            return Err(Error::NonPositiveSize);
        }

        Ok(Self {
            content,
            file_name,
            file_size,
        })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let file_size = std::fs::metadata(path)?.len();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(content, file_name, file_size)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }
}

/// True when the root element's tag name contains `xbrl`, ignoring case.
pub fn is_xbrl_doc(content: &str) -> bool {
    root_element_name(content)
        .map(|name| name.to_lowercase().contains("xbrl"))
        .unwrap_or(false)
}

/// Qualified name of the first element, if the prolog parses.
pub fn root_element_name(content: &str) -> Option<String> {
    let mut reader = Reader::from_str(content);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.name().as_ref()).into_owned())
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}
