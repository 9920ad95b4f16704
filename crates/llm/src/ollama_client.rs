use async_trait::async_trait;
use docsum_common::{DocsumError, ProviderConfig, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::http::{build_http_client, probe, send_json};
use crate::llm_trait::ChatClient;
use crate::types::{ChatRequest, ChatResponse, ProviderId, Role};

/// Ollama chat request
#[derive(Debug, Clone, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama chat response (non-streaming)
#[derive(Debug, Clone, Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    model: String,
    message: Option<OllamaMessage>,
    #[serde(default)]
    prompt_eval_count: u64,
    #[serde(default)]
    eval_count: u64,
}

/// Ollama API client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    config: ProviderConfig,
    client: Client,
}

impl OllamaClient {
    /// Create new Ollama client
    pub fn new(config: ProviderConfig, timeout: Duration) -> Result<Self> {
        let client = build_http_client(timeout)?;
        info!("Ollama client initialized: {} ({})", config.base_url, config.model);
        Ok(Self { config, client })
    }

    fn build_request(&self, request: &ChatRequest) -> OllamaChatRequest {
        let mut messages = vec![OllamaMessage {
            role: "system".to_string(),
            content: request.system.clone(),
        }];
        messages.extend(request.messages.iter().map(|m| OllamaMessage {
            role: match m.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            }
            .to_string(),
            content: m.content.clone(),
        }));

        OllamaChatRequest {
            model: self.config.model.clone(),
            messages,
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }

    fn parse_response(&self, response: OllamaChatResponse) -> Result<ChatResponse> {
        let text = response.message.map(|m| m.content).unwrap_or_default();
        if text.is_empty() {
            return Err(DocsumError::llm("Empty response from Ollama"));
        }

        Ok(ChatResponse {
            text,
            tokens_used: response.prompt_eval_count + response.eval_count,
            model: if response.model.is_empty() {
                self.config.model.clone()
            } else {
                response.model
            },
        })
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/api/chat", self.config.base_url);
        let body = self.build_request(&request);

        debug!(
            "Sending chat request to Ollama - Model: {}, Turns: {}",
            body.model,
            body.messages.len()
        );

        let response: OllamaChatResponse =
            send_json(self.client.post(&url).json(&body), ProviderId::Ollama).await?;

        debug!(
            "Received response from Ollama - Prompt tokens: {}, Output tokens: {}",
            response.prompt_eval_count, response.eval_count
        );

        self.parse_response(response)
    }

    fn provider(&self) -> ProviderId {
        ProviderId::Ollama
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    /// Ollama needs no key; a configured base URL is enough
    fn has_credentials(&self) -> bool {
        !self.config.base_url.is_empty()
    }

    /// Test connection to Ollama
    async fn test_connection(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.config.base_url);
        probe(self.client.get(&url), ProviderId::Ollama).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;

    fn client(base_url: &str) -> OllamaClient {
        let mut config = docsum_common::AppConfig::default().ollama;
        config.base_url = base_url.to_string();
        OllamaClient::new(config, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_build_request_disables_streaming() {
        let request = ChatRequest {
            system: "sys".to_string(),
            messages: vec![ChatMessage::user("Summarize the following text:\n\nhello")],
            temperature: 0.3,
            max_tokens: 512,
        };
        let body = serde_json::to_value(client("http://localhost:11434").build_request(&request))
            .unwrap();
        assert_eq!(body["model"], "llama3.2:latest");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 512);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
    }

    #[test]
    fn test_parse_response() {
        let raw = r#"{
            "model": "llama3.2:latest",
            "message": {"role": "assistant", "content": "Local summary."},
            "done": true,
            "prompt_eval_count": 26,
            "eval_count": 290
        }"#;
        let response: OllamaChatResponse = serde_json::from_str(raw).unwrap();
        let parsed = client("http://localhost:11434").parse_response(response).unwrap();
        assert_eq!(parsed.text, "Local summary.");
        assert_eq!(parsed.tokens_used, 316);
    }

    #[test]
    fn test_empty_response_is_error() {
        let response: OllamaChatResponse =
            serde_json::from_str(r#"{"message": {"role": "assistant", "content": ""}}"#).unwrap();
        assert!(client("http://localhost:11434").parse_response(response).is_err());
    }

    #[test]
    fn test_credentials_follow_base_url() {
        assert!(client("http://localhost:11434").has_credentials());
        assert!(!client("").has_credentials());
    }
}
