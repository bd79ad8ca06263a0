//! Remote text-generation capability shared by the policy assistant.
//!
//! - [`config`]: provider kind and the per-model config, plus env loaders.
//! - [`services`]: thin HTTP clients for Gemini and Ollama.
//! - [`LlmService`]: a client built once from an explicit config.
//! - [`TextGenerator`]: the seam the pipeline depends on; tests plug doubles in here.
//! - [`telemetry`]: tracing layer and filter helpers for binaries.

pub mod config {
    pub mod default_config;
    pub mod llm_model_config;
    pub mod llm_provider;
}

pub mod services {
    pub mod gemini_service;
    pub mod ollama_service;
}

pub mod error_handler;
pub mod generator;
pub mod llm_service;
pub mod telemetry;

pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::{ConfigError, LlmError};
pub use generator::{GenerateFuture, TextGenerator};
pub use llm_service::LlmService;
