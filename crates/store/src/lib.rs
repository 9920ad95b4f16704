//! docsum local persistence
//!
//! JSON-file stores for generated summaries and user prompt templates

mod summaries;
mod templates;

pub use summaries::{NewSummary, StoredSummary, SummaryMetadata, SummaryStore};
pub use templates::{TemplateDraft, TemplateStore};

use docsum_common::{DocsumError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::Path;

/// Read a JSON array file, treating a missing file as empty
fn load_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let data = fs::read_to_string(path)
        .map_err(|e| DocsumError::storage(format!("Failed to read {}: {}", path.display(), e)))?;
    if data.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&data)
        .map_err(|e| DocsumError::storage(format!("Corrupt store {}: {}", path.display(), e)))
}

fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            DocsumError::storage(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }
    let data = serde_json::to_string_pretty(records)?;
    fs::write(path, data)
        .map_err(|e| DocsumError::storage(format!("Failed to write {}: {}", path.display(), e)))
}
