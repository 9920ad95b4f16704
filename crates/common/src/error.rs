/// docsum error types
#[derive(Debug, thiserror::Error)]
pub enum DocsumError {
    /// Requested provider is not registered or failed its availability probe
    #[error("AI service provider '{0}' is not available")]
    ProviderUnavailable(String),

    /// Summarization was invoked without any chunks
    #[error("Nothing to summarize: {0}")]
    NothingToSummarize(String),

    /// LLM provider rejected the request or returned something unusable
    #[error("LLM error: {0}")]
    Llm(String),

    /// Text extraction failed
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Persisting or loading records failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network/HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DocsumError {
    /// Create provider-unavailable error
    pub fn provider_unavailable<S: Into<String>>(provider: S) -> Self {
        Self::ProviderUnavailable(provider.into())
    }

    /// Create nothing-to-summarize error
    pub fn nothing_to_summarize<S: Into<String>>(msg: S) -> Self {
        Self::NothingToSummarize(msg.into())
    }

    /// Create LLM error
    pub fn llm<S: Into<String>>(msg: S) -> Self {
        Self::Llm(msg.into())
    }

    /// Create extraction error
    pub fn extraction<S: Into<String>>(msg: S) -> Self {
        Self::Extraction(msg.into())
    }

    /// Create storage error
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create not found error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

// Process exit code conversion (for the CLI)
impl DocsumError {
    /// Get process exit code
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput(_) => 2,
            Self::NotFound(_) => 2,
            Self::NothingToSummarize(_) => 2,
            Self::Config(_) => 3,
            Self::ProviderUnavailable(_) => 3,
            Self::Extraction(_) => 4,
            Self::Llm(_) => 5,
            Self::Network(_) => 5,
            Self::Storage(_) => 6,
            Self::Io(_) => 1,
            Self::Json(_) => 1,
            Self::Internal(_) => 1,
            Self::Other(_) => 1,
        }
    }

    /// Whether the error comes from the persistence layer rather than the run itself
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
