use async_trait::async_trait;
use docsum_common::{DocsumError, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::llm_trait::{ChatClient, SummaryService};
use crate::prompts::{
    continuation_message, first_chunk_message, reconciliation_message, running_summary_message,
    with_final_directive, PromptComposer,
};
use crate::types::{
    ChatMessage, ChatRequest, ChatResponse, ProviderId, SummarizationOptions, SummarizationResult,
};

/// Phase of a summarization run
///
/// Every transition out of `Summarizing` or `Reconciling` corresponds to exactly
/// one model call. A single-chunk run goes straight from `Summarizing` to
/// `Completed`, so it never reconciles.
#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    Idle,
    Summarizing {
        index: usize,
        running_summary: Option<String>,
    },
    Reconciling {
        running_summary: String,
        final_part: String,
    },
    Completed(String),
    Failed,
}

/// One pass of the context-carrying protocol over a chunk sequence
pub struct SummaryRun<'a> {
    chunks: &'a [String],
    temperature: f32,
    max_tokens: u32,
    system_prompt: String,
    final_prompt: String,
    state: RunState,
    tokens_used: u64,
    calls: usize,
    model: Option<String>,
}

impl<'a> SummaryRun<'a> {
    /// Create an idle run
    pub fn new(
        chunks: &'a [String],
        options: &SummarizationOptions,
        composer: &PromptComposer,
        max_tokens: u32,
    ) -> Self {
        let system_prompt = composer.compose(options);
        Self {
            chunks,
            temperature: options.temperature,
            max_tokens,
            final_prompt: with_final_directive(&system_prompt),
            system_prompt,
            state: RunState::Idle,
            tokens_used: 0,
            calls: 0,
            model: None,
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Tokens accumulated so far
    pub fn tokens_used(&self) -> u64 {
        self.tokens_used
    }

    /// Model calls issued so far
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Model reported by the last call
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, RunState::Completed(_) | RunState::Failed)
    }

    /// Final summary, once completed
    pub fn into_summary(self) -> Option<String> {
        match self.state {
            RunState::Completed(summary) => Some(summary),
            _ => None,
        }
    }

    /// Request the current state would send, if it sends one
    pub fn next_request(&self) -> Option<ChatRequest> {
        match &self.state {
            RunState::Summarizing {
                index,
                running_summary,
            } => {
                let chunk = &self.chunks[*index];
                let messages = match running_summary {
                    None => vec![ChatMessage::user(first_chunk_message(chunk))],
                    Some(summary) => vec![
                        ChatMessage::assistant(running_summary_message(summary)),
                        ChatMessage::user(continuation_message(chunk)),
                    ],
                };
                Some(self.request(self.system_prompt.clone(), messages))
            }
            RunState::Reconciling {
                running_summary,
                final_part,
            } => Some(self.request(
                self.final_prompt.clone(),
                vec![ChatMessage::user(reconciliation_message(
                    running_summary,
                    final_part,
                ))],
            )),
            RunState::Idle | RunState::Completed(_) | RunState::Failed => None,
        }
    }

    fn request(&self, system: String, messages: Vec<ChatMessage>) -> ChatRequest {
        ChatRequest {
            system,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Advance the run by one transition
    pub async fn step(&mut self, client: &dyn ChatClient) -> Result<()> {
        if self.state == RunState::Idle {
            if self.chunks.is_empty() {
                self.state = RunState::Failed;
                return Err(DocsumError::nothing_to_summarize(
                    "the document produced no chunks",
                ));
            }
            self.state = RunState::Summarizing {
                index: 0,
                running_summary: None,
            };
            return Ok(());
        }

        let Some(request) = self.next_request() else {
            return Ok(());
        };

        debug!(
            "Model call {} - State: {}, Turns: {}",
            self.calls + 1,
            self.state_label(),
            request.messages.len()
        );

        let response = match client.chat(request).await {
            Ok(response) => response,
            Err(e) => {
                self.state = RunState::Failed;
                return Err(e);
            }
        };

        self.calls += 1;
        self.tokens_used += response.tokens_used;
        self.advance(response);
        Ok(())
    }

    fn advance(&mut self, response: ChatResponse) {
        if !response.model.is_empty() {
            self.model = Some(response.model);
        }
        let text = response.text;
        let last = self.chunks.len() - 1;

        self.state = match std::mem::replace(&mut self.state, RunState::Failed) {
            RunState::Summarizing { index: 0, .. } if last == 0 => RunState::Completed(text),
            RunState::Summarizing {
                index,
                running_summary,
            } if index == last => RunState::Reconciling {
                running_summary: running_summary.unwrap_or_default(),
                final_part: text,
            },
            RunState::Summarizing { index, .. } => RunState::Summarizing {
                index: index + 1,
                running_summary: Some(text),
            },
            RunState::Reconciling { .. } => RunState::Completed(text),
            other => other,
        };
    }

    fn state_label(&self) -> String {
        match &self.state {
            RunState::Idle => "idle".to_string(),
            RunState::Summarizing { index, .. } => {
                format!("summarizing {}/{}", index + 1, self.chunks.len())
            }
            RunState::Reconciling { .. } => "reconciling".to_string(),
            RunState::Completed(_) => "completed".to_string(),
            RunState::Failed => "failed".to_string(),
        }
    }
}

/// Sequential, context-carrying summarizer over one chat backend
pub struct Summarizer {
    client: Arc<dyn ChatClient>,
    composer: Arc<PromptComposer>,
    max_tokens: u32,
}

impl Summarizer {
    /// Create new summarizer
    pub fn new(client: Arc<dyn ChatClient>, composer: Arc<PromptComposer>, max_tokens: u32) -> Self {
        Self {
            client,
            composer,
            max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    pub fn client(&self) -> &dyn ChatClient {
        self.client.as_ref()
    }
}

#[async_trait]
impl SummaryService for Summarizer {
    async fn summarize(
        &self,
        chunks: &[String],
        options: &SummarizationOptions,
    ) -> Result<SummarizationResult> {
        let provider = self.provider();
        if !self.is_available() {
            return Err(DocsumError::provider_unavailable(provider.as_str()));
        }

        if options.provider != provider {
            warn!(
                "Options request provider '{}' but backend is '{}'",
                options.provider, provider
            );
        }

        info!(
            "Starting summarization - Provider: {}, Model: {}, Chunks: {}, Format: {}",
            provider,
            self.model(),
            chunks.len(),
            options.format
        );

        let mut run = SummaryRun::new(chunks, options, &self.composer, self.max_tokens);
        while !run.is_finished() {
            if let Err(e) = run.step(self.client.as_ref()).await {
                warn!("Summarization aborted after {} calls: {}", run.calls(), e);
                return Err(e);
            }
        }

        let tokens_used = run.tokens_used();
        let calls = run.calls();
        let model = run.model().unwrap_or(self.model()).to_string();
        let summary = run
            .into_summary()
            .ok_or_else(|| DocsumError::internal("run finished without a summary"))?;

        info!(
            "Summarization completed - Calls: {}, Tokens: {}, Length: {} chars",
            calls,
            tokens_used,
            summary.len()
        );

        Ok(SummarizationResult {
            summary,
            provider,
            model,
            tokens_used,
        })
    }

    fn is_available(&self) -> bool {
        self.client.has_credentials()
    }

    fn provider(&self) -> ProviderId {
        self.client.provider()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChatClient;
    use crate::prompts::{FINAL_SUMMARY_DIRECTIVE, MARKDOWN_GUIDANCE};
    use crate::types::Role;

    fn summarizer(client: Arc<MockChatClient>) -> Summarizer {
        Summarizer::new(client, Arc::new(PromptComposer::default()), 4000)
    }

    fn chunks(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_single_chunk_makes_one_call() {
        let client = Arc::new(MockChatClient::new(ProviderId::OpenAi).with_reply("Short summary.", 42));
        let summarizer = summarizer(client.clone());
        let options = SummarizationOptions::default().with_format("paragraph");

        let result = summarizer
            .summarize(&chunks(&["short chunk"]), &options)
            .await
            .unwrap();

        assert_eq!(client.request_count(), 1);
        assert_eq!(result.summary, "Short summary.");
        assert_eq!(result.tokens_used, 42);
        assert_eq!(result.provider, ProviderId::OpenAi);
        assert_eq!(result.model, "mock-model");

        let request = &client.requests()[0];
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, Role::User);
        assert_eq!(
            request.messages[0].content,
            "Summarize the following text:\n\nshort chunk"
        );
        assert!(request.system.ends_with(MARKDOWN_GUIDANCE));
        assert!(!request.system.contains(FINAL_SUMMARY_DIRECTIVE));
    }

    #[tokio::test]
    async fn test_three_chunks_carry_context_and_reconcile() {
        let client = Arc::new(
            MockChatClient::new(ProviderId::OpenAi)
                .with_reply("S1", 10)
                .with_reply("S2", 20)
                .with_reply("S3", 30)
                .with_reply("FINAL", 40),
        );
        let summarizer = summarizer(client.clone());

        let result = summarizer
            .summarize(
                &chunks(&["chunk A", "chunk B", "chunk C"]),
                &SummarizationOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(result.summary, "FINAL");
        assert_eq!(result.tokens_used, 100);

        let requests = client.requests();
        assert_eq!(requests.len(), 4);

        assert!(requests[0].messages[0].content.ends_with("chunk A"));

        // Interior chunk: running summary as prior context, then the new chunk
        assert_eq!(requests[1].messages.len(), 2);
        assert_eq!(requests[1].messages[0].role, Role::Assistant);
        assert_eq!(requests[1].messages[0].content, "Previous summary so far:\nS1");
        assert_eq!(
            requests[1].messages[1].content,
            "Continue summarizing with this additional context:\n\nchunk B"
        );

        // Last chunk sees the running summary after B (replaced, not concatenated)
        assert_eq!(requests[2].messages[0].content, "Previous summary so far:\nS2");
        assert!(requests[2].messages[1].content.ends_with("chunk C"));

        // Reconciliation merges the running summary with chunk C's standalone summary
        let reconcile = &requests[3];
        assert!(reconcile.system.ends_with(FINAL_SUMMARY_DIRECTIVE));
        assert_eq!(reconcile.messages.len(), 1);
        assert!(reconcile.messages[0].content.contains("Previous summaries:\nS2"));
        assert!(reconcile.messages[0].content.contains("Final part summary:\nS3"));
    }

    #[tokio::test]
    async fn test_n_chunks_make_n_plus_one_calls() {
        let mut client = MockChatClient::new(ProviderId::Anthropic);
        for i in 0..6 {
            client = client.with_reply(format!("summary {}", i), 7);
        }
        let client = Arc::new(client);
        let summarizer = summarizer(client.clone());
        let options = SummarizationOptions::new(ProviderId::Anthropic);

        let result = summarizer
            .summarize(&chunks(&["a", "b", "c", "d", "e"]), &options)
            .await
            .unwrap();

        assert_eq!(client.request_count(), 6);
        assert_eq!(result.tokens_used, 42);
        assert_eq!(result.summary, "summary 5");
    }

    #[tokio::test]
    async fn test_options_pass_through() {
        let client = Arc::new(MockChatClient::new(ProviderId::OpenAi).with_reply("x", 1));
        let summarizer = Summarizer::new(client.clone(), Arc::new(PromptComposer::default()), 1234);
        let options = SummarizationOptions::default()
            .with_temperature(0.7)
            .with_language("French");

        summarizer.summarize(&chunks(&["text"]), &options).await.unwrap();

        let request = &client.requests()[0];
        assert_eq!(request.temperature, 0.7);
        assert_eq!(request.max_tokens, 1234);
        assert!(request.system.contains("Provide the summary in French."));
    }

    #[tokio::test]
    async fn test_failure_aborts_run() {
        let client = Arc::new(
            MockChatClient::new(ProviderId::OpenAi)
                .with_reply("S1", 10)
                .with_failure("rate limited")
                .with_reply("never used", 10),
        );
        let summarizer = summarizer(client.clone());

        let err = summarizer
            .summarize(&chunks(&["a", "b", "c"]), &SummarizationOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, DocsumError::Llm(_)));
        assert_eq!(client.request_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_chunks_is_an_error() {
        let client = Arc::new(MockChatClient::new(ProviderId::OpenAi).with_reply("x", 1));
        let summarizer = summarizer(client.clone());

        let err = summarizer
            .summarize(&[], &SummarizationOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, DocsumError::NothingToSummarize(_)));
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn test_unavailable_backend_makes_no_calls() {
        let client = Arc::new(
            MockChatClient::new(ProviderId::Google)
                .without_credentials()
                .with_reply("x", 1),
        );
        let summarizer = summarizer(client.clone());

        let err = summarizer
            .summarize(&chunks(&["a"]), &SummarizationOptions::new(ProviderId::Google))
            .await
            .unwrap_err();

        assert!(matches!(err, DocsumError::ProviderUnavailable(_)));
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn test_run_state_transitions() {
        let client = MockChatClient::new(ProviderId::OpenAi)
            .with_reply("S1", 1)
            .with_reply("S2", 1)
            .with_reply("FINAL", 1);
        let composer = PromptComposer::default();
        let options = SummarizationOptions::default();
        let input = chunks(&["a", "b"]);
        let mut run = SummaryRun::new(&input, &options, &composer, 100);

        assert_eq!(run.state(), &RunState::Idle);
        assert!(run.next_request().is_none());

        run.step(&client).await.unwrap();
        assert_eq!(
            run.state(),
            &RunState::Summarizing {
                index: 0,
                running_summary: None
            }
        );
        assert_eq!(run.calls(), 0);

        run.step(&client).await.unwrap();
        assert_eq!(
            run.state(),
            &RunState::Summarizing {
                index: 1,
                running_summary: Some("S1".to_string())
            }
        );

        run.step(&client).await.unwrap();
        assert_eq!(
            run.state(),
            &RunState::Reconciling {
                running_summary: "S1".to_string(),
                final_part: "S2".to_string()
            }
        );

        run.step(&client).await.unwrap();
        assert_eq!(run.state(), &RunState::Completed("FINAL".to_string()));
        assert!(run.is_finished());
        assert_eq!(run.calls(), 3);
        assert_eq!(run.tokens_used(), 3);
    }

    #[tokio::test]
    async fn test_failed_state_after_error() {
        let client = MockChatClient::new(ProviderId::OpenAi).with_failure("boom");
        let composer = PromptComposer::default();
        let options = SummarizationOptions::default();
        let input = chunks(&["a", "b"]);
        let mut run = SummaryRun::new(&input, &options, &composer, 100);

        run.step(&client).await.unwrap();
        assert!(run.step(&client).await.is_err());
        assert_eq!(run.state(), &RunState::Failed);
        assert!(run.is_finished());
        assert!(run.into_summary().is_none());
    }
}
