use async_trait::async_trait;
use docsum_common::{DocsumError, ProviderConfig, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::http::{build_http_client, probe, send_json};
use crate::llm_trait::ChatClient;
use crate::types::{ChatRequest, ChatResponse, ProviderId, Role};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    total_token_count: u64,
}

fn text_content(role: Option<&str>, text: impl Into<String>) -> Content {
    Content {
        role: role.map(str::to_string),
        parts: vec![Part { text: text.into() }],
    }
}

/// Google Gemini generateContent client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: ProviderConfig,
    client: Client,
}

impl GeminiClient {
    pub fn new(config: ProviderConfig, timeout: Duration) -> Result<Self> {
        let client = build_http_client(timeout)?;
        info!("Gemini client initialized: {} ({})", config.base_url, config.model);
        Ok(Self { config, client })
    }

    fn api_key(&self) -> &str {
        self.config.api_key.as_deref().unwrap_or_default()
    }

    fn build_request(&self, request: &ChatRequest) -> GenerateRequest {
        let contents = request
            .user_first_messages()
            .into_iter()
            .map(|m| {
                let role = match m.role {
                    Role::Assistant => "model",
                    _ => "user",
                };
                text_content(Some(role), m.content)
            })
            .collect();

        GenerateRequest {
            system_instruction: (!request.system.is_empty())
                .then(|| text_content(None, request.system.clone())),
            contents,
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        }
    }

    fn parse_response(&self, response: GenerateResponse) -> Result<ChatResponse> {
        let content = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .ok_or_else(|| DocsumError::llm("Gemini response has no candidates"))?;

        let text = content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(ChatResponse {
            text,
            tokens_used: response
                .usage_metadata
                .map(|u| u.total_token_count)
                .unwrap_or(0),
            model: response
                .model_version
                .unwrap_or_else(|| self.config.model.clone()),
        })
    }
}

#[async_trait]
impl ChatClient for GeminiClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let body = self.build_request(&request);

        debug!(
            "Sending chat request to Gemini - Model: {}, Turns: {}",
            self.config.model,
            body.contents.len()
        );

        let response: GenerateResponse = send_json(
            self.client
                .post(&url)
                .query(&[("key", self.api_key())])
                .json(&body),
            ProviderId::Google,
        )
        .await?;

        self.parse_response(response)
    }

    fn provider(&self) -> ProviderId {
        ProviderId::Google
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn has_credentials(&self) -> bool {
        self.config.has_api_key()
    }

    async fn test_connection(&self) -> Result<bool> {
        let url = format!("{}/v1beta/models", self.config.base_url);
        probe(
            self.client.get(&url).query(&[("key", self.api_key())]),
            ProviderId::Google,
        )
        .await
    }
}
