use docsum_common::{DocsumError, Result};
use docsum_document::{PdfProcessor, ProcessedDocument};
use docsum_llm::{ProviderRegistry, SummarizationOptions, SummarizationResult};
use docsum_store::{NewSummary, StoredSummary, SummaryMetadata, SummaryStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Workflow execution steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    Extraction,
    Summarization,
    Saving,
}

impl WorkflowStep {
    pub fn message(&self) -> &'static str {
        match self {
            WorkflowStep::Extraction => "Extracting text from PDF...",
            WorkflowStep::Summarization => "Generating summary...",
            WorkflowStep::Saving => "Saving summary...",
        }
    }
}

/// What to summarize and how
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub path: PathBuf,
    pub options: SummarizationOptions,

    /// Stored title; defaults to the PDF title, then the file stem
    pub title: Option<String>,

    /// Persist the result
    pub save: bool,
}

/// Result of the persistence step, reported apart from the summary itself
#[derive(Debug)]
pub enum SaveOutcome {
    Saved(StoredSummary),
    Skipped,
    Failed(DocsumError),
}

/// Workflow execution result
#[derive(Debug)]
pub struct WorkflowResult {
    pub summary: SummarizationResult,
    pub page_count: usize,
    pub chunk_count: usize,
    pub save: SaveOutcome,
}

/// Process → summarize → save for one document
pub struct SummaryWorkflow {
    processor: PdfProcessor,
    registry: Arc<ProviderRegistry>,
    store: Arc<RwLock<SummaryStore>>,
}

impl SummaryWorkflow {
    pub fn new(
        processor: PdfProcessor,
        registry: Arc<ProviderRegistry>,
        store: Arc<RwLock<SummaryStore>>,
    ) -> Self {
        Self {
            processor,
            registry,
            store,
        }
    }

    /// Execute workflow for a file
    ///
    /// Fails before reading the file when the requested provider is not
    /// registered. Extraction and summarization failures abort the workflow; a
    /// failed save does not.
    pub async fn execute(
        &self,
        request: &SummaryRequest,
        progress: &(dyn Fn(WorkflowStep) + Send + Sync),
    ) -> Result<WorkflowResult> {
        self.registry.get_service(request.options.provider)?;

        progress(WorkflowStep::Extraction);
        let document = self.processor.process_file(&request.path).await?;

        self.summarize_document(document, request, progress).await
    }

    /// Summarize an already processed document and persist the result
    pub async fn summarize_document(
        &self,
        document: ProcessedDocument,
        request: &SummaryRequest,
        progress: &(dyn Fn(WorkflowStep) + Send + Sync),
    ) -> Result<WorkflowResult> {
        info!(
            "Starting summarization workflow for file: {} ({} chunks)",
            document.file_name,
            document.chunks.len()
        );

        progress(WorkflowStep::Summarization);
        let summary = self
            .registry
            .summarize(&document.chunks, &request.options)
            .await?;

        let save = if request.save {
            progress(WorkflowStep::Saving);
            let title = request
                .title
                .clone()
                .filter(|t| !t.trim().is_empty())
                .or_else(|| document.metadata.title.clone())
                .unwrap_or_else(|| default_title(&request.path, &document.file_name));
            self.persist(title, &document, &request.options, &summary)
                .await
        } else {
            SaveOutcome::Skipped
        };

        Ok(WorkflowResult {
            page_count: document.metadata.total_pages,
            chunk_count: document.chunks.len(),
            summary,
            save,
        })
    }

    async fn persist(
        &self,
        title: String,
        document: &ProcessedDocument,
        options: &SummarizationOptions,
        summary: &SummarizationResult,
    ) -> SaveOutcome {
        let record = NewSummary {
            title,
            content: summary.summary.clone(),
            format: options.format.clone(),
            metadata: Some(SummaryMetadata {
                file_name: Some(document.file_name.clone()),
                file_size: Some(document.file_size),
                page_count: Some(document.metadata.total_pages),
                provider: Some(summary.provider),
                model: Some(summary.model.clone()),
                tokens_used: Some(summary.tokens_used),
            }),
        };

        match self.store.write().await.save(record) {
            Ok(stored) => SaveOutcome::Saved(stored),
            Err(e) => {
                warn!("Summary generated but not saved: {}", e);
                SaveOutcome::Failed(e)
            }
        }
    }
}

fn default_title(path: &Path, file_name: &str) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| file_name.to_string())
}
