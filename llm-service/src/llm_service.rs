//! Text-generation service built once from an explicit [`LlmModelConfig`].
//!
//! - Construct once at startup, wrap in `Arc`, and pass clones to dependents.
//! - Dispatches to the provider-specific client chosen by `cfg.provider`.
//! - Implements [`TextGenerator`], so the pipeline never sees provider details.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use llm_service::{LlmService, TextGenerator, config::default_config::config_from_env};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let svc = Arc::new(LlmService::new(config_from_env()?)?);
//!     let txt = svc.generate("Is dental care covered?").await?;
//!     println!("{txt}");
//!     Ok(())
//! }
//! ```

use tracing::info;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{ConfigError, LlmError},
    generator::{GenerateFuture, TextGenerator},
    services::{gemini_service::GeminiService, ollama_service::OllamaService},
};

enum Backend {
    Gemini(GeminiService),
    Ollama(OllamaService),
}

/// Provider-agnostic generation client.
pub struct LlmService {
    cfg: LlmModelConfig,
    backend: Backend,
}

impl LlmService {
    /// Builds the provider client for `cfg`.
    ///
    /// # Errors
    /// - [`ConfigError::EmptyModel`] if no model is configured
    /// - any error of the provider client constructor
    pub fn new(cfg: LlmModelConfig) -> Result<Self, LlmError> {
        if cfg.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }

        let backend = match cfg.provider {
            LlmProvider::Gemini => Backend::Gemini(GeminiService::new(cfg.clone())?),
            LlmProvider::Ollama => Backend::Ollama(OllamaService::new(cfg.clone())?),
        };

        info!(provider = %cfg.provider, model = %cfg.model, "LlmService ready");

        Ok(Self { cfg, backend })
    }

    /// The config this service was built from.
    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }

    /// Sends a single prompt and returns the raw response text.
    ///
    /// # Errors
    /// Returns [`LlmError`] if the call fails at any layer.
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        match &self.backend {
            Backend::Gemini(cli) => cli.generate(prompt).await,
            Backend::Ollama(cli) => cli.generate(prompt).await,
        }
    }
}

impl TextGenerator for LlmService {
    fn model(&self) -> &str {
        &self.cfg.model
    }

    fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a> {
        Box::pin(LlmService::generate(self, prompt))
    }
}
