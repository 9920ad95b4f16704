use crate::error::DocsumError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Connection settings for one LLM provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (None when the provider has no credential configured)
    pub api_key: Option<String>,

    /// Model name
    pub model: String,

    /// Max tokens requested per completion
    pub max_tokens: u32,

    /// API base URL, without trailing slash
    pub base_url: String,
}

impl ProviderConfig {
    fn new(model: &str, base_url: &str) -> Self {
        Self {
            api_key: None,
            model: model.to_string(),
            max_tokens: 4000,
            base_url: base_url.to_string(),
        }
    }

    /// Whether a non-empty API key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    fn from_env(prefix: &str, defaults: ProviderConfig) -> Self {
        Self {
            api_key: std::env::var(format!("{}_API_KEY", prefix))
                .ok()
                .or(defaults.api_key),
            model: std::env::var(format!("{}_MODEL", prefix)).unwrap_or(defaults.model),
            max_tokens: std::env::var(format!("{}_MAX_TOKENS", prefix))
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_tokens),
            base_url: std::env::var(format!("{}_BASE_URL", prefix))
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
        }
    }
}

/// docsum application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding stored summaries and user templates
    pub data_dir: PathBuf,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,

    /// OpenAI settings
    pub openai: ProviderConfig,

    /// Anthropic settings
    pub anthropic: ProviderConfig,

    /// Google Gemini settings
    pub gemini: ProviderConfig,

    /// Ollama settings (an empty base URL means not configured)
    pub ollama: ProviderConfig,

    /// Chunk budget in characters
    pub chunk_size: usize,

    /// Words carried over between consecutive chunks
    pub chunk_overlap: usize,

    /// Upload size limit in megabytes
    pub max_upload_mb: u64,

    /// HTTP transport timeout for model calls, in seconds
    pub http_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./db"),
            log_dir: PathBuf::from("./db/log"),
            log_level: "info".to_string(),
            openai: ProviderConfig::new("gpt-4-turbo-preview", "https://api.openai.com"),
            anthropic: ProviderConfig::new("claude-3-opus-20240229", "https://api.anthropic.com"),
            gemini: ProviderConfig::new(
                "gemini-1.5-pro",
                "https://generativelanguage.googleapis.com",
            ),
            ollama: ProviderConfig::new("llama3.2:latest", ""),
            chunk_size: 5000,
            chunk_overlap: 200,
            max_upload_mb: 10,
            http_timeout_secs: 300,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self, DocsumError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        let defaults = Self::default();

        let mut gemini = ProviderConfig::from_env("GEMINI", defaults.gemini);
        if !gemini.has_api_key() {
            gemini.api_key = std::env::var("GOOGLE_API_KEY").ok();
        }

        let config = Self {
            data_dir: Self::get_env_path("DATA_DIR").unwrap_or(defaults.data_dir),
            log_dir: Self::get_env_path("LOG_DIR").unwrap_or(defaults.log_dir),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            openai: ProviderConfig::from_env("OPENAI", defaults.openai),
            anthropic: ProviderConfig::from_env("ANTHROPIC", defaults.anthropic),
            gemini,
            ollama: ProviderConfig::from_env("OLLAMA", defaults.ollama),
            chunk_size: Self::get_env_parsed("CHUNK_SIZE").unwrap_or(defaults.chunk_size),
            chunk_overlap: Self::get_env_parsed("CHUNK_OVERLAP")
                .unwrap_or(defaults.chunk_overlap),
            max_upload_mb: Self::get_env_parsed("MAX_UPLOAD_MB")
                .unwrap_or(defaults.max_upload_mb),
            http_timeout_secs: Self::get_env_parsed("HTTP_TIMEOUT_SECS")
                .unwrap_or(defaults.http_timeout_secs),
        };

        config.validate()?;

        // Ensure required directories exist
        config.ensure_directories()?;

        Ok(config)
    }

    /// Get PathBuf from environment variable
    fn get_env_path(key: &str) -> Option<PathBuf> {
        std::env::var(key).ok().map(PathBuf::from)
    }

    fn get_env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
        std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
    }

    /// Ensure required directories exist, create if not
    pub fn ensure_directories(&self) -> Result<(), DocsumError> {
        for dir in [&self.data_dir, &self.log_dir] {
            if !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| {
                    DocsumError::config(format!(
                        "Failed to create directory {}: {}",
                        dir.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(())
    }

    /// Path of the stored summaries file
    pub fn summaries_path(&self) -> PathBuf {
        self.data_dir.join("summaries.json")
    }

    /// Path of the user prompt templates file
    pub fn templates_path(&self) -> PathBuf {
        self.data_dir.join("prompt_templates.json")
    }

    /// Upload size limit in bytes
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), DocsumError> {
        if self.chunk_size == 0 {
            return Err(DocsumError::config("Chunk size cannot be 0"));
        }

        // Overlap is counted in words and the budget in characters; a word takes
        // at least two characters once joined, so this keeps every chunk advancing.
        if self.chunk_overlap * 2 >= self.chunk_size {
            return Err(DocsumError::config(format!(
                "Chunk overlap ({} words) is too large for chunk size ({} chars)",
                self.chunk_overlap, self.chunk_size
            )));
        }

        let providers = [
            ("OpenAI", &self.openai),
            ("Anthropic", &self.anthropic),
            ("Gemini", &self.gemini),
            ("Ollama", &self.ollama),
        ];

        for (name, provider) in providers {
            if provider.model.trim().is_empty() {
                return Err(DocsumError::config(format!(
                    "{} model name cannot be empty",
                    name
                )));
            }

            if !provider.base_url.is_empty()
                && !provider.base_url.starts_with("http://")
                && !provider.base_url.starts_with("https://")
            {
                return Err(DocsumError::config(format!(
                    "{} base URL must start with http:// or https://",
                    name
                )));
            }
        }

        Ok(())
    }
}
