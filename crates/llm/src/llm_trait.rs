use async_trait::async_trait;
use docsum_common::Result;

use crate::types::{ChatRequest, ChatResponse, ProviderId, SummarizationOptions, SummarizationResult};

/// Common trait for chat-completion clients
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send one completion request
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Provider this client talks to
    fn provider(&self) -> ProviderId;

    /// Model requested on every call
    fn model(&self) -> &str;

    /// Availability probe: is a credential (or endpoint) configured
    fn has_credentials(&self) -> bool;

    /// Test connection/credentials against the live API
    async fn test_connection(&self) -> Result<bool>;
}

/// A registered summarization backend
#[async_trait]
pub trait SummaryService: Send + Sync {
    /// Run the sequential summarization protocol over `chunks`
    async fn summarize(
        &self,
        chunks: &[String],
        options: &SummarizationOptions,
    ) -> Result<SummarizationResult>;

    /// Whether the backend can serve requests
    fn is_available(&self) -> bool;

    /// Provider identifier
    fn provider(&self) -> ProviderId;
}
