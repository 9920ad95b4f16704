//! docsum document processing
//!
//! PDF text extraction, upload validation and document-to-chunks processing

pub mod pdf;
pub mod processor;
pub mod types;

#[cfg(test)]
mod fixtures;

// Re-export main types
pub use pdf::{extract_pdf, validate_upload};
pub use processor::PdfProcessor;
pub use types::{DocumentMetadata, ExtractedDocument, PageText, ProcessedDocument};
