//! Runtime configuration loaded from environment variables.
//!
//! | Variable                 | Default      |
//! |--------------------------|--------------|
//! | `QA_CONTEXT_BUDGET`      | `extended`   |
//! | `QA_SUMMARY_INPUT_CHARS` | `25000`      |
//! | `QA_SUMMARY_WORDS`       | `120`        |
//! | `QA_CONTEXT_SOURCE`      | `summary`    |
//! | `QA_ANSWER_MODE`         | `structured` |
//!
//! Model settings come from [`LlmModelConfig::from_env`].

use std::{fmt, str::FromStr};

use llm_service::LlmModelConfig;
use llm_service::error_handler::env_opt;
use serde::{Deserialize, Serialize};

use crate::error::AnalystError;
use crate::prompt::ContextBudget;
use crate::summarize::SummaryLimits;

/// What the answer prompt is grounded on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextSource {
    /// Concurrent per-document summaries, cached per upload set.
    #[default]
    Summary,
    /// The merged raw text of all uploads.
    Corpus,
}

/// Shape of the answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    /// JSON decision record.
    #[default]
    Structured,
    /// Conversational text.
    Prose,
}

impl fmt::Display for ContextSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContextSource::Summary => "summary",
            ContextSource::Corpus => "corpus",
        })
    }
}

impl FromStr for ContextSource {
    type Err = AnalystError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "summary" => Ok(ContextSource::Summary),
            "corpus" => Ok(ContextSource::Corpus),
            other => Err(AnalystError::Config(format!(
                "context source must be summary or corpus, got `{other}`"
            ))),
        }
    }
}

impl fmt::Display for AnswerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AnswerMode::Structured => "structured",
            AnswerMode::Prose => "prose",
        })
    }
}

impl FromStr for AnswerMode {
    type Err = AnalystError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "structured" | "json" => Ok(AnswerMode::Structured),
            "prose" | "text" => Ok(AnswerMode::Prose),
            other => Err(AnalystError::Config(format!(
                "answer mode must be structured or prose, got `{other}`"
            ))),
        }
    }
}

/// Everything the analyst needs, built once and passed explicitly.
#[derive(Debug, Clone)]
pub struct AnalystConfig {
    pub llm: LlmModelConfig,
    pub context_budget: ContextBudget,
    pub summary: SummaryLimits,
    pub context_source: ContextSource,
    pub answer_mode: AnswerMode,
}

impl AnalystConfig {
    /// Config with default pipeline knobs around the given model config.
    pub fn new(llm: LlmModelConfig) -> Self {
        Self {
            llm,
            context_budget: ContextBudget::default(),
            summary: SummaryLimits::default(),
            context_source: ContextSource::default(),
            answer_mode: AnswerMode::default(),
        }
    }

    /// # Errors
    /// [`AnalystError::Llm`] for model settings, [`AnalystError::Config`] for
    /// malformed `QA_*` values.
    pub fn from_env() -> Result<Self, AnalystError> {
        let mut cfg = Self::new(LlmModelConfig::from_env()?);

        if let Some(v) = env_opt("QA_CONTEXT_BUDGET") {
            cfg.context_budget = v.parse()?;
        }
        cfg.summary.input_chars = parse_usize("QA_SUMMARY_INPUT_CHARS", cfg.summary.input_chars)?;
        cfg.summary.words = parse_usize("QA_SUMMARY_WORDS", cfg.summary.words)?;
        if let Some(v) = env_opt("QA_CONTEXT_SOURCE") {
            cfg.context_source = v.parse()?;
        }
        if let Some(v) = env_opt("QA_ANSWER_MODE") {
            cfg.answer_mode = v.parse()?;
        }
        Ok(cfg)
    }
}

fn parse_usize(var: &str, default: usize) -> Result<usize, AnalystError> {
    match env_opt(var) {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| AnalystError::Config(format!("{var} must be a non-negative integer, got `{v}`"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_and_source_parsing() {
        assert_eq!("Prose".parse::<AnswerMode>().unwrap(), AnswerMode::Prose);
        assert_eq!("json".parse::<AnswerMode>().unwrap(), AnswerMode::Structured);
        assert!("yaml".parse::<AnswerMode>().is_err());
        assert_eq!("corpus".parse::<ContextSource>().unwrap(), ContextSource::Corpus);
        assert!("index".parse::<ContextSource>().is_err());
    }

    #[test]
    fn modes_use_lowercase_wire_names() {
        assert_eq!(serde_json::to_value(AnswerMode::Prose).unwrap(), "prose");
        let mode: AnswerMode = serde_json::from_str("\"structured\"").unwrap();
        assert_eq!(mode, AnswerMode::Structured);
        assert_eq!(AnswerMode::Structured.to_string(), "structured");
    }
}
