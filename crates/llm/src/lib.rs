//! docsum LLM integration
//!
//! Chunking, prompt composition, the sequential summarization engine and the
//! provider backends it runs against.

mod anthropic_client;
mod chunking;
mod gemini_client;
mod http;
mod llm_trait;
mod ollama_client;
mod openai_client;
mod prompts;
mod registry;
mod summarize;
mod types;

#[cfg(any(test, feature = "testing"))]
pub mod mock;

pub use anthropic_client::AnthropicClient;
pub use chunking::{chunk_text, Chunker, CHUNK_OVERLAP, CHUNK_SIZE};
pub use gemini_client::GeminiClient;
pub use llm_trait::{ChatClient, SummaryService};
pub use ollama_client::OllamaClient;
pub use openai_client::OpenAiClient;
pub use prompts::{
    render_template, system_templates, PromptComposer, PromptOption, PromptTemplate,
    TemplateRegistry,
};
pub use registry::{build_clients, provider_config, ProviderRegistry};
pub use summarize::{RunState, SummaryRun, Summarizer};
pub use types::{
    ChatMessage, ChatRequest, ChatResponse, CustomPrompt, ProviderId, Role,
    SummarizationOptions, SummarizationResult, DEFAULT_FORMAT, DEFAULT_TEMPERATURE,
};
