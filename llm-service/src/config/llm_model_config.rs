use crate::config::llm_provider::LlmProvider;

/// Configuration for one generative model.
///
/// Built once at startup (see [`crate::config::default_config`]) and handed
/// to [`crate::LlmService::new`]. Nothing here is read from the environment
/// after construction.
///
/// # Examples
///
/// ```
/// use llm_service::{LlmModelConfig, LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::Gemini,
///     model: "gemini-1.5-flash".to_string(),
///     endpoint: "https://generativelanguage.googleapis.com".to_string(),
///     api_key: Some("key".to_string()),
///     max_tokens: None,
///     temperature: None,
///     top_p: None,
///     timeout_secs: None,
/// };
/// assert!(cfg.has_credential());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The provider/backend.
    pub provider: LlmProvider,

    /// Model identifier (e.g. `"gemini-1.5-flash"`, `"llama3.1:8b"`).
    pub model: String,

    /// Base URL of the provider API.
    pub endpoint: String,

    /// Credential for providers that require one.
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Request timeout in seconds. `None` keeps the HTTP client default.
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// `true` unless the provider needs a key and none is configured.
    pub fn has_credential(&self) -> bool {
        !self.provider.requires_api_key()
            || self
                .api_key
                .as_deref()
                .is_some_and(|k| !k.trim().is_empty())
    }
}
