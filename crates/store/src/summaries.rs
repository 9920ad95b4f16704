use chrono::{DateTime, Utc};
use docsum_common::Result;
use docsum_llm::ProviderId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{load_records, write_records};

/// Where a summary came from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
}

/// Summary to persist; id and timestamp are assigned on save
#[derive(Debug, Clone, PartialEq)]
pub struct NewSummary {
    pub title: String,
    pub content: String,
    pub format: String,
    pub metadata: Option<SummaryMetadata>,
}

/// Persisted summary record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSummary {
    pub id: String,
    pub title: String,
    pub content: String,
    pub format: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SummaryMetadata>,
}

/// Summary records kept in a JSON file
pub struct SummaryStore {
    records: Vec<StoredSummary>,
    file_path: PathBuf,
}

impl SummaryStore {
    pub fn load(path: &Path) -> Result<Self> {
        let records: Vec<StoredSummary> = load_records(path)?;
        debug!("Loaded {} summaries from {}", records.len(), path.display());
        Ok(Self {
            records,
            file_path: path.to_path_buf(),
        })
    }

    /// Persist a new summary, assigning its id and creation time
    pub fn save(&mut self, summary: NewSummary) -> Result<StoredSummary> {
        let stored = StoredSummary {
            id: Uuid::new_v4().to_string(),
            title: summary.title,
            content: summary.content,
            format: summary.format,
            created_at: Utc::now(),
            metadata: summary.metadata,
        };

        self.records.push(stored.clone());
        if let Err(e) = self.flush() {
            self.records.pop();
            return Err(e);
        }

        info!("Summary saved: {} ({})", stored.title, stored.id);
        Ok(stored)
    }

    /// All summaries, newest first
    pub fn list_all(&self) -> Vec<StoredSummary> {
        let mut records: Vec<StoredSummary> = self.records.iter().rev().cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    pub fn get(&self, id: &str) -> Option<&StoredSummary> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Remove a summary; returns whether it existed
    pub fn delete_by_id(&mut self, id: &str) -> Result<bool> {
        let Some(position) = self.records.iter().position(|r| r.id == id) else {
            return Ok(false);
        };

        let removed = self.records.remove(position);
        if let Err(e) = self.flush() {
            self.records.insert(position, removed);
            return Err(e);
        }

        info!("Summary deleted: {}", id);
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn flush(&self) -> Result<()> {
        write_records(&self.file_path, &self.records)
    }
}
