use docsum_common::{AppConfig, DocsumError, ProviderConfig, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::anthropic_client::AnthropicClient;
use crate::gemini_client::GeminiClient;
use crate::llm_trait::{ChatClient, SummaryService};
use crate::ollama_client::OllamaClient;
use crate::openai_client::OpenAiClient;
use crate::prompts::PromptComposer;
use crate::summarize::Summarizer;
use crate::types::{ProviderId, SummarizationOptions, SummarizationResult};

/// Connection settings for a provider
pub fn provider_config(config: &AppConfig, provider: ProviderId) -> &ProviderConfig {
    match provider {
        ProviderId::OpenAi => &config.openai,
        ProviderId::Anthropic => &config.anthropic,
        ProviderId::Google => &config.gemini,
        ProviderId::Ollama => &config.ollama,
    }
}

/// One chat client per known provider, configured or not
pub fn build_clients(config: &AppConfig) -> Result<Vec<Arc<dyn ChatClient>>> {
    let timeout = Duration::from_secs(config.http_timeout_secs);
    let clients: Vec<Arc<dyn ChatClient>> = vec![
        Arc::new(OpenAiClient::new(config.openai.clone(), timeout)?),
        Arc::new(AnthropicClient::new(config.anthropic.clone(), timeout)?),
        Arc::new(GeminiClient::new(config.gemini.clone(), timeout)?),
        Arc::new(OllamaClient::new(config.ollama.clone(), timeout)?),
    ];
    Ok(clients)
}

/// Set of summarization backends that passed their availability probe
///
/// Built once at startup and shared read-only afterwards.
#[derive(Default)]
pub struct ProviderRegistry {
    services: BTreeMap<ProviderId, Arc<dyn SummaryService>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every known backend from configuration and keep the available ones
    pub fn from_config(config: &AppConfig, composer: Arc<PromptComposer>) -> Result<Self> {
        let mut registry = Self::new();
        for client in build_clients(config)? {
            let max_tokens = provider_config(config, client.provider()).max_tokens;
            registry.register(Arc::new(Summarizer::new(client, composer.clone(), max_tokens)));
        }

        info!(
            "Provider registry ready - Available: [{}]",
            registry
                .available_providers()
                .iter()
                .map(ProviderId::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(registry)
    }

    /// Add a backend if its availability probe succeeds
    ///
    /// Returns whether the backend was registered.
    pub fn register(&mut self, service: Arc<dyn SummaryService>) -> bool {
        let provider = service.provider();
        if !service.is_available() {
            debug!("Skipping provider '{}': not configured", provider);
            return false;
        }
        debug!("Registered provider '{}'", provider);
        self.services.insert(provider, service);
        true
    }

    /// Registered providers, in stable order
    pub fn available_providers(&self) -> Vec<ProviderId> {
        self.services.keys().copied().collect()
    }

    pub fn is_available(&self, provider: ProviderId) -> bool {
        self.services.contains_key(&provider)
    }

    pub fn get_service(&self, provider: ProviderId) -> Result<Arc<dyn SummaryService>> {
        self.services
            .get(&provider)
            .cloned()
            .ok_or_else(|| DocsumError::provider_unavailable(provider.as_str()))
    }

    /// Dispatch a run to the backend named by `options.provider`
    pub async fn summarize(
        &self,
        chunks: &[String],
        options: &SummarizationOptions,
    ) -> Result<SummarizationResult> {
        let service = self.get_service(options.provider)?;
        service.summarize(chunks, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChatClient;

    fn service(client: MockChatClient) -> Arc<dyn SummaryService> {
        Arc::new(Summarizer::new(
            Arc::new(client),
            Arc::new(PromptComposer::default()),
            4000,
        ))
    }

    #[test]
    fn test_register_skips_unavailable() {
        let mut registry = ProviderRegistry::new();
        assert!(registry.register(service(MockChatClient::new(ProviderId::Google))));
        assert!(!registry.register(service(
            MockChatClient::new(ProviderId::Anthropic).without_credentials()
        )));
        assert!(registry.register(service(MockChatClient::new(ProviderId::OpenAi))));

        assert_eq!(
            registry.available_providers(),
            vec![ProviderId::OpenAi, ProviderId::Google]
        );
        assert!(registry.is_available(ProviderId::Google));
        assert!(!registry.is_available(ProviderId::Anthropic));
    }

    #[test]
    fn test_get_service_miss_is_unavailable() {
        let registry = ProviderRegistry::new();
        let err = registry.get_service(ProviderId::Anthropic).err().unwrap();
        assert!(matches!(err, DocsumError::ProviderUnavailable(ref p) if p == "anthropic"));
        assert_eq!(
            err.to_string(),
            "AI service provider 'anthropic' is not available"
        );
    }

    #[tokio::test]
    async fn test_summarize_dispatches_on_provider() {
        let mut registry = ProviderRegistry::new();
        registry.register(service(
            MockChatClient::new(ProviderId::OpenAi).with_reply("from openai", 5),
        ));
        registry.register(service(
            MockChatClient::new(ProviderId::Ollama).with_reply("from ollama", 7),
        ));

        let chunks = vec!["some text".to_string()];
        let result = registry
            .summarize(&chunks, &SummarizationOptions::new(ProviderId::Ollama))
            .await
            .unwrap();
        assert_eq!(result.summary, "from ollama");
        assert_eq!(result.provider, ProviderId::Ollama);
        assert_eq!(result.tokens_used, 7);
    }

    #[tokio::test]
    async fn test_summarize_unregistered_provider_fails() {
        let registry = ProviderRegistry::new();
        let chunks = vec!["some text".to_string()];
        let err = registry
            .summarize(&chunks, &SummarizationOptions::new(ProviderId::Google))
            .await
            .unwrap_err();
        assert!(matches!(err, DocsumError::ProviderUnavailable(_)));
    }

    #[test]
    fn test_build_clients_covers_every_provider() {
        let clients = build_clients(&AppConfig::default()).unwrap();
        let providers: Vec<ProviderId> = clients.iter().map(|c| c.provider()).collect();
        assert_eq!(providers, ProviderId::ALL.to_vec());
        assert_eq!(clients[1].model(), "claude-3-opus-20240229");
    }

    #[test]
    fn test_from_config_registers_configured_providers() {
        let mut config = AppConfig::default();
        config.openai.api_key = Some("sk-test".to_string());
        config.anthropic.api_key = Some("   ".to_string());
        config.ollama.base_url = "http://localhost:11434".to_string();

        let registry =
            ProviderRegistry::from_config(&config, Arc::new(PromptComposer::default())).unwrap();
        assert_eq!(
            registry.available_providers(),
            vec![ProviderId::OpenAi, ProviderId::Ollama]
        );
    }
}
