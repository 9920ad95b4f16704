use docsum_common::DocsumError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Language-model vendor identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenAi,
    Anthropic,
    Google,
    Ollama,
}

impl ProviderId {
    /// All known providers, in registration order
    pub const ALL: [ProviderId; 4] = [
        ProviderId::OpenAi,
        ProviderId::Anthropic,
        ProviderId::Google,
        ProviderId::Ollama,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Anthropic => "anthropic",
            ProviderId::Google => "google",
            ProviderId::Ollama => "ollama",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = DocsumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderId::OpenAi),
            "anthropic" | "claude" => Ok(ProviderId::Anthropic),
            "google" | "gemini" => Ok(ProviderId::Google),
            "ollama" => Ok(ProviderId::Ollama),
            other => Err(DocsumError::invalid_input(format!(
                "Unknown provider '{}'",
                other
            ))),
        }
    }
}

/// Conversational role of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Provider-neutral completion request
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// System instruction
    pub system: String,

    /// Ordered conversational turns (no system turns)
    pub messages: Vec<ChatMessage>,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens to generate
    pub max_tokens: u32,
}

/// Opening turn inserted when a conversation would start with the model
pub const CONVERSATION_OPENER: &str = "Summarize the document I am sharing with you.";

impl ChatRequest {
    /// Turns arranged to open with a user turn
    ///
    /// Anthropic and Gemini reject conversations whose first turn belongs to
    /// the model.
    pub fn user_first_messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.messages.len() + 1);
        if self
            .messages
            .first()
            .is_some_and(|m| m.role == Role::Assistant)
        {
            messages.push(ChatMessage::user(CONVERSATION_OPENER));
        }
        messages.extend(
            self.messages
                .iter()
                .filter(|m| m.role != Role::System)
                .cloned(),
        );
        messages
    }
}

/// Provider-neutral completion response
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    /// Completion text
    pub text: String,

    /// Tokens reported by the provider for this call (0 when not reported)
    pub tokens_used: u64,

    /// Model that served the call
    pub model: String,
}

/// Fully custom instruction overriding the named format
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomPrompt {
    /// Instruction text with optional `{{key}}` placeholders
    pub template: String,

    /// Placeholder values
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Default named format
pub const DEFAULT_FORMAT: &str = "paragraph";

/// Summarization run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizationOptions {
    /// Backend to use
    pub provider: ProviderId,

    /// Named prompt template
    pub format: String,

    /// Advisory word-count ceiling, passed to the model
    pub max_length: Option<u32>,

    /// Target output language
    pub language: Option<String>,

    /// Sampling temperature
    pub temperature: f32,

    /// Custom template that wins over `format`
    pub custom_prompt: Option<CustomPrompt>,
}

impl SummarizationOptions {
    pub fn new(provider: ProviderId) -> Self {
        Self {
            provider,
            format: DEFAULT_FORMAT.to_string(),
            max_length: None,
            language: None,
            temperature: DEFAULT_TEMPERATURE,
            custom_prompt: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_max_length(mut self, words: u32) -> Self {
        self.max_length = Some(words);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_custom_prompt(mut self, prompt: CustomPrompt) -> Self {
        self.custom_prompt = Some(prompt);
        self
    }
}

impl Default for SummarizationOptions {
    fn default() -> Self {
        Self::new(ProviderId::OpenAi)
    }
}

/// Summarization result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizationResult {
    /// Final reconciled summary
    pub summary: String,

    /// Provider that produced it
    pub provider: ProviderId,

    /// Model used
    pub model: String,

    /// Tokens used across every call of the run
    pub tokens_used: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_id_parsing() {
        assert_eq!("openai".parse::<ProviderId>().unwrap(), ProviderId::OpenAi);
        assert_eq!(" Gemini ".parse::<ProviderId>().unwrap(), ProviderId::Google);
        assert_eq!("claude".parse::<ProviderId>().unwrap(), ProviderId::Anthropic);
        assert!("mistral".parse::<ProviderId>().is_err());
    }

    #[test]
    fn test_provider_id_serde() {
        let json = serde_json::to_string(&ProviderId::OpenAi).unwrap();
        assert_eq!(json, "\"openai\"");
        assert_eq!(ProviderId::Google.to_string(), "google");
    }

    #[test]
    fn test_user_first_messages() {
        let request = ChatRequest {
            system: "sys".to_string(),
            messages: vec![
                ChatMessage::assistant("Previous summary so far:\nS1"),
                ChatMessage::user("more"),
            ],
            temperature: 0.3,
            max_tokens: 10,
        };
        let turns = request.user_first_messages();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0], ChatMessage::user(CONVERSATION_OPENER));
        assert_eq!(turns[1].role, Role::Assistant);

        let plain = ChatRequest {
            messages: vec![ChatMessage::user("hello")],
            ..request
        };
        assert_eq!(plain.user_first_messages(), vec![ChatMessage::user("hello")]);
    }

    #[test]
    fn test_default_options() {
        let options = SummarizationOptions::default();
        assert_eq!(options.format, "paragraph");
        assert_eq!(options.temperature, 0.3);
        assert!(options.language.is_none());
        assert!(options.max_length.is_none());
        assert!(options.custom_prompt.is_none());
    }
}
