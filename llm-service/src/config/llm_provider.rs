use std::{fmt, str::FromStr};

use crate::error_handler::ConfigError;

/// Backend used for text generation.
///
/// # Examples
///
/// ```
/// use llm_service::LlmProvider;
///
/// let p: LlmProvider = "gemini".parse().unwrap();
/// assert_eq!(p, LlmProvider::Gemini);
/// assert!(p.requires_api_key());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Google Gemini `generateContent` REST API.
    Gemini,
    /// Local Ollama runtime.
    Ollama,
}

impl LlmProvider {
    /// Whether calls are rejected upstream without a credential.
    pub fn requires_api_key(self) -> bool {
        matches!(self, LlmProvider::Gemini)
    }

    /// Name of the env variable holding the credential, if any.
    pub fn api_key_var(self) -> Option<&'static str> {
        match self {
            LlmProvider::Gemini => Some("GEMINI_API_KEY"),
            LlmProvider::Ollama => None,
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProvider::Gemini => f.write_str("gemini"),
            LlmProvider::Ollama => f.write_str("ollama"),
        }
    }
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(LlmProvider::Gemini),
            "ollama" => Ok(LlmProvider::Ollama),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}
