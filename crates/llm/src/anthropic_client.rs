use async_trait::async_trait;
use docsum_common::{DocsumError, ProviderConfig, Result};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::http::{build_http_client, probe, send_json};
use crate::llm_trait::ChatClient;
use crate::types::{ChatRequest, ChatResponse, ProviderId, Role};

/// API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    system: String,
    messages: Vec<MessageTurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
struct MessageTurn {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<MessagesUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct MessagesUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

/// Anthropic Messages API client
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    config: ProviderConfig,
    client: Client,
}

impl AnthropicClient {
    pub fn new(config: ProviderConfig, timeout: Duration) -> Result<Self> {
        let client = build_http_client(timeout)?;
        info!(
            "Anthropic client initialized: {} ({})",
            config.base_url, config.model
        );
        Ok(Self { config, client })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("x-api-key", self.config.api_key.as_deref().unwrap_or_default())
            .header("anthropic-version", ANTHROPIC_VERSION)
    }

    fn build_request(&self, request: &ChatRequest) -> MessagesRequest {
        let messages = request
            .user_first_messages()
            .into_iter()
            .map(|m| MessageTurn {
                role: match m.role {
                    Role::Assistant => "assistant",
                    _ => "user",
                },
                content: m.content,
            })
            .collect();

        MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: request.max_tokens,
            system: request.system.clone(),
            messages,
            temperature: Some(request.temperature),
        }
    }

    fn parse_response(&self, response: MessagesResponse) -> Result<ChatResponse> {
        if response.content.is_empty() {
            return Err(DocsumError::llm("Anthropic response has no content"));
        }

        let text = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        let tokens_used = response
            .usage
            .map(|u| u.input_tokens + u.output_tokens)
            .unwrap_or(0);

        Ok(ChatResponse {
            text,
            tokens_used,
            model: if response.model.is_empty() {
                self.config.model.clone()
            } else {
                response.model
            },
        })
    }
}

#[async_trait]
impl ChatClient for AnthropicClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/v1/messages", self.config.base_url);
        let body = self.build_request(&request);

        debug!(
            "Sending chat request to Anthropic - Model: {}, Turns: {}",
            body.model,
            body.messages.len()
        );

        let response: MessagesResponse =
            send_json(self.authorized(self.client.post(&url)).json(&body), ProviderId::Anthropic)
                .await?;

        self.parse_response(response)
    }

    fn provider(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn has_credentials(&self) -> bool {
        self.config.has_api_key()
    }

    /// Anthropic exposes no free listing endpoint, so send a one-token message
    async fn test_connection(&self) -> Result<bool> {
        let url = format!("{}/v1/messages", self.config.base_url);
        let body = MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: 1,
            system: String::new(),
            messages: vec![MessageTurn {
                role: "user",
                content: "Hi".to_string(),
            }],
            temperature: None,
        };
        probe(
            self.authorized(self.client.post(&url)).json(&body),
            ProviderId::Anthropic,
        )
        .await
    }
}
