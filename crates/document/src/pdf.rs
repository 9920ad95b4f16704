use docsum_common::{DocsumError, Result};
use lopdf::{decode_text_string, Document};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::debug;

use crate::types::{DocumentMetadata, ExtractedDocument, PageText};

/// Reject anything that is not a PDF or exceeds the size limit
pub fn validate_upload(file_name: &str, size: u64, max_bytes: u64) -> Result<()> {
    let is_pdf = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Err(DocsumError::invalid_input(format!(
            "Only PDF files are allowed: {}",
            file_name
        )));
    }

    if size > max_bytes {
        return Err(DocsumError::invalid_input(format!(
            "File size must be less than {}MB ({} bytes given)",
            max_bytes / (1024 * 1024),
            size
        )));
    }

    Ok(())
}

/// Extract page texts and document metadata from PDF bytes
///
/// pdf-extract panics on some malformed inputs; those panics are reported as
/// extraction errors.
pub fn extract_pdf(bytes: &[u8]) -> Result<ExtractedDocument> {
    let document = Document::load_mem(bytes)
        .map_err(|e| DocsumError::extraction(format!("Failed to read PDF: {}", e)))?;
    let metadata = read_metadata(&document);

    let texts = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }))
    .map_err(|payload| {
        DocsumError::extraction(format!(
            "PDF text extraction failed: {}",
            panic_message(payload.as_ref())
        ))
    })?
    .map_err(|e| DocsumError::extraction(format!("Failed to extract PDF text: {}", e)))?;

    if texts.len() != metadata.total_pages {
        debug!(
            "Extracted text for {} of {} pages",
            texts.len(),
            metadata.total_pages
        );
    }

    let pages: Vec<PageText> = texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| PageText::new(i + 1, text.trim()))
        .collect();

    debug!(
        "Extracted PDF text - Pages: {}, Characters: {}",
        metadata.total_pages,
        pages.iter().map(|p| p.text.len()).sum::<usize>()
    );

    Ok(ExtractedDocument { pages, metadata })
}

fn read_metadata(document: &Document) -> DocumentMetadata {
    let (title, author) = if document.is_encrypted() {
        (None, None)
    } else {
        (info_field(document, b"Title"), info_field(document, b"Author"))
    };

    DocumentMetadata {
        total_pages: document.get_pages().len(),
        title,
        author,
    }
}

/// Text entry of the trailer's information dictionary
fn info_field(document: &Document, key: &[u8]) -> Option<String> {
    let info = document.trailer.get(b"Info").ok()?;
    let (_, info) = document.dereference(info).ok()?;
    let value = info.as_dict().ok()?.get(key).ok()?;
    let (_, value) = document.dereference(value).ok()?;
    decode_text_string(value)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
