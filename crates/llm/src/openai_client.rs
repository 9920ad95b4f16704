use async_trait::async_trait;
use docsum_common::{DocsumError, ProviderConfig, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::http::{build_http_client, probe, send_json};
use crate::llm_trait::ChatClient;
use crate::types::{ChatRequest, ChatResponse, ProviderId, Role};

/// OpenAI chat completions request
#[derive(Debug, Clone, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<CompletionMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
struct CompletionMessage {
    role: &'static str,
    content: String,
}

/// OpenAI chat completions response
#[derive(Debug, Clone, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CompletionUsage {
    #[serde(default)]
    total_tokens: u64,
}

/// OpenAI API client
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: ProviderConfig,
    client: Client,
}

impl OpenAiClient {
    /// Create new OpenAI client
    pub fn new(config: ProviderConfig, timeout: Duration) -> Result<Self> {
        let client = build_http_client(timeout)?;
        info!("OpenAI client initialized: {} ({})", config.base_url, config.model);
        Ok(Self { config, client })
    }

    fn api_key(&self) -> &str {
        self.config.api_key.as_deref().unwrap_or_default()
    }

    fn build_request(&self, request: &ChatRequest) -> CompletionRequest {
        let mut messages = vec![CompletionMessage {
            role: "system",
            content: request.system.clone(),
        }];
        messages.extend(request.messages.iter().map(|m| CompletionMessage {
            role: match m.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: m.content.clone(),
        }));

        CompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    fn parse_response(&self, response: CompletionResponse) -> Result<ChatResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DocsumError::llm("OpenAI response has no choices"))?;

        Ok(ChatResponse {
            text: choice.message.content.unwrap_or_default(),
            tokens_used: response.usage.map(|u| u.total_tokens).unwrap_or(0),
            model: if response.model.is_empty() {
                self.config.model.clone()
            } else {
                response.model
            },
        })
    }
}

#[async_trait]
impl ChatClient for OpenAiClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/v1/chat/completions", self.config.base_url);
        let body = self.build_request(&request);

        debug!(
            "Sending chat request to OpenAI - Model: {}, Turns: {}",
            body.model,
            body.messages.len()
        );

        let response: CompletionResponse = send_json(
            self.client.post(&url).bearer_auth(self.api_key()).json(&body),
            ProviderId::OpenAi,
        )
        .await?;

        self.parse_response(response)
    }

    fn provider(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn has_credentials(&self) -> bool {
        self.config.has_api_key()
    }

    async fn test_connection(&self) -> Result<bool> {
        let url = format!("{}/v1/models", self.config.base_url);
        probe(
            self.client.get(&url).bearer_auth(self.api_key()),
            ProviderId::OpenAi,
        )
        .await
    }
}
