//! Recording chat client for tests

use async_trait::async_trait;
use docsum_common::{DocsumError, Result};
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::llm_trait::ChatClient;
use crate::types::{ChatRequest, ChatResponse, ProviderId};

#[derive(Debug)]
enum MockReply {
    Text { text: String, tokens: u64 },
    Failure(String),
}

/// A mock client for testing purposes.
///
/// Replies are returned in order and every request is logged. Running out of
/// replies is an error.
#[derive(Debug)]
pub struct MockChatClient {
    provider: ProviderId,
    model: String,
    credentials: bool,
    replies: Mutex<VecDeque<MockReply>>,
    request_log: Mutex<Vec<ChatRequest>>,
}

impl MockChatClient {
    pub fn new(provider: ProviderId) -> Self {
        Self {
            provider,
            model: "mock-model".to_string(),
            credentials: true,
            replies: Mutex::new(VecDeque::new()),
            request_log: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply
    pub fn with_reply(self, text: impl Into<String>, tokens: u64) -> Self {
        self.replies.lock().unwrap().push_back(MockReply::Text {
            text: text.into(),
            tokens,
        });
        self
    }

    /// Queue a provider-side failure
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(MockReply::Failure(message.into()));
        self
    }

    /// Make the availability probe fail
    pub fn without_credentials(mut self) -> Self {
        self.credentials = false;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// All requests made so far
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.request_log.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.request_log.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.request_log.lock().unwrap().push(request);

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(MockReply::Text { text, tokens }) => Ok(ChatResponse {
                text,
                tokens_used: tokens,
                model: self.model.clone(),
            }),
            Some(MockReply::Failure(message)) => Err(DocsumError::llm(message)),
            None => Err(DocsumError::llm("MockChatClient: no more replies available")),
        }
    }

    fn provider(&self) -> ProviderId {
        self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn has_credentials(&self) -> bool {
        self.credentials
    }

    async fn test_connection(&self) -> Result<bool> {
        Ok(self.credentials)
    }
}
