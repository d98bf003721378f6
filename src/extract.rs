//! Text extraction for uploaded files (PDF, DOCX, image).
//!
//! The file kind is a closed enum dispatched on the filename extension;
//! unknown extensions extract to nothing rather than erroring. A file that
//! fails to extract degrades to empty text with a warning so that the rest
//! of the upload batch is never affected.

use std::io::Read;

use anyhow::Result;

use crate::ocr::OcrProvider;

/// Maximum decompressed bytes read from a DOCX ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Kind of an uploaded file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Docx,
    Image,
    Unknown,
}

impl FileKind {
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.ends_with(".pdf") {
            FileKind::Pdf
        } else if lower.ends_with(".docx") {
            FileKind::Docx
        } else if lower.ends_with(".png") || lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
            FileKind::Image
        } else {
            FileKind::Unknown
        }
    }
}

/// Extraction error for a single file.
#[derive(Debug)]
pub enum ExtractError {
    Pdf(String),
    Docx(String),
    Ocr(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
            ExtractError::Docx(e) => write!(f, "DOCX extraction failed: {}", e),
            ExtractError::Ocr(e) => write!(f, "OCR failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Result of extracting one file.
#[derive(Debug)]
pub struct Extracted {
    pub text: String,
    /// True when the OCR path was taken, even if the OCR call failed.
    pub was_ocr: bool,
    /// Non-fatal condition that degraded this file's text to empty.
    pub warning: Option<String>,
}

/// Extract plain text from an uploaded file.
///
/// Never fails: a parse or OCR error is reported through
/// [`Extracted::warning`] with empty text, and unknown extensions yield
/// empty text with no warning.
pub async fn extract(name: &str, bytes: &[u8], ocr: &dyn OcrProvider) -> Extracted {
    let (result, was_ocr) = match FileKind::from_name(name) {
        FileKind::Pdf => (extract_pdf(bytes), false),
        FileKind::Docx => (extract_docx(bytes), false),
        FileKind::Image => (extract_image(name, bytes, ocr).await, true),
        FileKind::Unknown => {
            return Extracted {
                text: String::new(),
                was_ocr: false,
                warning: None,
            }
        }
    };

    match result {
        Ok(text) => Extracted {
            text,
            was_ocr,
            warning: None,
        },
        Err(e) => Extracted {
            text: String::new(),
            was_ocr,
            warning: Some(format!("{}: {}", name, e)),
        },
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

async fn extract_image(
    name: &str,
    bytes: &[u8],
    ocr: &dyn OcrProvider,
) -> Result<String, ExtractError> {
    ocr.recognize(name, bytes)
        .await
        .map_err(|e| ExtractError::Ocr(e.to_string()))
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    let mut doc_xml = Vec::new();
    let mut found = false;
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| ExtractError::Docx(e.to_string()))?;
        if entry.name() == "word/document.xml" {
            entry
                .take(MAX_XML_ENTRY_BYTES)
                .read_to_end(&mut doc_xml)
                .map_err(|e| ExtractError::Docx(e.to_string()))?;
            if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
                return Err(ExtractError::Docx(
                    "word/document.xml exceeds size limit".to_string(),
                ));
            }
            found = true;
            break;
        }
    }
    if !found {
        return Err(ExtractError::Docx(
            "word/document.xml not found".to_string(),
        ));
    }
    extract_paragraphs(&doc_xml)
}

/// Walk the WordprocessingML body collecting `w:t` runs, one output line
/// per `w:p` paragraph.
fn extract_paragraphs(xml: &[u8]) -> Result<String, ExtractError> {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        current.push_str(te.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"p" {
                    paragraphs.push(std::mem::take(&mut current));
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    Ok(paragraphs.join("\n"))
}
