use lopdf::Document as PdfDocument;
use sha2::{Digest, Sha256};
use std::fmt;

/// Inspection failure, reported separately from generation errors so a bad
/// artifact never masquerades as a builder fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectError {
    pub message: String,
}

impl fmt::Display for InspectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pdf inspection failed: {}", self.message)
    }
}

impl std::error::Error for InspectError {}

/// Extracted text of one page. `number` is 1-based, as in PDF viewers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

/// Parsed view of a generated document, used by tests and tooling to assert
/// on real artifact bytes instead of in-memory command lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectReport {
    pub page_count: usize,
    pub pages: Vec<PageText>,
}

impl InspectReport {
    pub fn contains_text(&self, needle: &str) -> bool {
        self.pages.iter().any(|page| page.text.contains(needle))
    }

    pub fn page_contains_text(&self, number: u32, needle: &str) -> bool {
        self.page_text(number)
            .map(|text| text.contains(needle))
            .unwrap_or(false)
    }

    pub fn page_text(&self, number: u32) -> Option<&str> {
        self.pages
            .iter()
            .find(|page| page.number == number)
            .map(|page| page.text.as_str())
    }
}

/// Parses PDF bytes and extracts per-page text. Pages whose content cannot be
/// decoded contribute empty text rather than failing the whole report.
pub fn inspect_bytes(bytes: &[u8]) -> Result<InspectReport, InspectError> {
    let document = PdfDocument::load_mem(bytes).map_err(|err| InspectError {
        message: err.to_string(),
    })?;
    let page_map = document.get_pages();
    let mut pages = Vec::with_capacity(page_map.len());
    for number in page_map.keys() {
        let text = document.extract_text(&[*number]).unwrap_or_default();
        pages.push(PageText {
            number: *number,
            text,
        });
    }
    Ok(InspectReport {
        page_count: pages.len(),
        pages,
    })
}

/// Full SHA-256 of the artifact bytes as lowercase hex. Two runs over the
/// same builder state produce the same fingerprint.
pub fn fingerprint(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex = String::with_capacity(64);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}
