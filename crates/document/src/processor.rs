use docsum_common::{AppConfig, DocsumError, Result};
use docsum_llm::Chunker;
use std::path::Path;
use tracing::{info, warn};

use crate::pdf::{extract_pdf, validate_upload};
use crate::types::ProcessedDocument;

/// Turns a PDF file into summarization-ready chunks
#[derive(Debug, Clone)]
pub struct PdfProcessor {
    chunker: Chunker,
    max_upload_bytes: u64,
}

impl PdfProcessor {
    pub fn new(chunker: Chunker, max_upload_bytes: u64) -> Self {
        Self {
            chunker,
            max_upload_bytes,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Chunker::new(config.chunk_size, config.chunk_overlap),
            config.max_upload_bytes(),
        )
    }

    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    /// Validate, extract and chunk a PDF from disk
    pub async fn process_file(&self, path: impl AsRef<Path>) -> Result<ProcessedDocument> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                DocsumError::invalid_input(format!("Invalid file path: {}", path.display()))
            })?
            .to_string();

        let file_size = match tokio::fs::metadata(path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DocsumError::not_found(format!(
                    "File not found: {}",
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        validate_upload(&file_name, file_size, self.max_upload_bytes)?;

        info!("Processing PDF: {} ({} bytes)", file_name, file_size);

        let bytes = tokio::fs::read(path).await?;
        let extracted = tokio::task::spawn_blocking(move || extract_pdf(&bytes))
            .await
            .map_err(|e| DocsumError::extraction(format!("PDF extraction task failed: {}", e)))??;

        if !extracted.has_text() {
            warn!("No text content found in {}", file_name);
        }

        let chunks = self.chunker.chunk(&extracted.full_text());

        info!(
            "PDF processed - Pages: {}, Chunks: {}",
            extracted.metadata.total_pages,
            chunks.len()
        );

        Ok(ProcessedDocument {
            chunks,
            metadata: extracted.metadata,
            file_name,
            file_size,
        })
    }
}

impl Default for PdfProcessor {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}
