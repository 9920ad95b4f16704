use serde::{Deserialize, Serialize};

/// Text of a single page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    /// 1-based page number
    pub page_number: usize,

    /// Extracted text (may be empty for image-only pages)
    pub text: String,
}

impl PageText {
    pub fn new(page_number: usize, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Document-level metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Number of pages in the page tree
    pub total_pages: usize,

    /// `/Title` from the document information dictionary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// `/Author` from the document information dictionary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Raw extraction output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub pages: Vec<PageText>,
    pub metadata: DocumentMetadata,
}

impl ExtractedDocument {
    pub fn new(pages: Vec<PageText>) -> Self {
        let metadata = DocumentMetadata {
            total_pages: pages.len(),
            ..Default::default()
        };
        Self { pages, metadata }
    }

    /// Page texts joined with a single space
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether any page carries text
    pub fn has_text(&self) -> bool {
        self.pages.iter().any(|p| !p.is_blank())
    }
}

/// A document ready for summarization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedDocument {
    /// Ordered, overlapping text chunks
    pub chunks: Vec<String>,

    pub metadata: DocumentMetadata,

    /// Source file name
    pub file_name: String,

    /// Source file size in bytes
    pub file_size: u64,
}
