//! Response normalization for structured and prose answers.
//!
//! Structured mode does not enforce a schema: whatever JSON the model
//! produced is passed through, and [`PolicyDecision::from_value`] reads it
//! with defaults for missing keys.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{AnalystError, ErrorKind};

/// Shown instead of an answer when the remote service reports quota exhaustion.
pub const RATE_LIMIT_ADVISORY: &str = "The AI service is receiving too many requests right now \
(rate limit reached). Please wait a minute and ask again.";

/// Justification used by the chat fallback shape.
pub const PARSE_FAILURE: &str = "Parse failure";

const FENCE_JSON: &str = "```json";
const FENCE: &str = "```";

/// Decision values the structured prompt asks for, plus the local error marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approved,
    Rejected,
    Error,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Approved => "Approved",
            Decision::Rejected => "Rejected",
            Decision::Error => "Error",
        }
    }

    /// Case-insensitive match of a model-provided string.
    pub fn parse(s: &str) -> Option<Self> {
        [Decision::Approved, Decision::Rejected, Decision::Error]
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

/// Typed view over a structured answer.
///
/// `decision` is kept as the model wrote it; use [`PolicyDecision::decision_kind`]
/// to branch on the known values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub decision: String,
    pub justification: String,
    pub relevant_clauses: Vec<String>,
}

impl PolicyDecision {
    /// The fixed shape returned by the chat flow when anything goes wrong.
    pub fn parse_failure() -> Self {
        Self {
            decision: Decision::Error.as_str().to_string(),
            justification: PARSE_FAILURE.to_string(),
            relevant_clauses: Vec::new(),
        }
    }

    /// Reads the three keys defensively; absent or mistyped keys become empty.
    /// Non-string clause entries are rendered as compact JSON.
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| match value.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        let relevant_clauses = match value.get("relevant_clauses") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
            _ => Vec::new(),
        };

        Self {
            decision: text("decision"),
            justification: text("justification"),
            relevant_clauses,
        }
    }

    pub fn decision_kind(&self) -> Option<Decision> {
        Decision::parse(&self.decision)
    }

    pub fn to_value(&self) -> Value {
        json!({
            "decision": self.decision,
            "justification": self.justification,
            "relevant_clauses": self.relevant_clauses,
        })
    }
}

/// `{"error": description}`, the single-shot failure shape.
pub fn error_object(description: impl Into<String>) -> Value {
    json!({ "error": description.into() })
}

/// Removes a leading ```` ```json ```` (or bare ```` ``` ````) and a trailing
/// ```` ``` ````, trimming whitespace around and between.
///
/// # Example
/// ```
/// use policy_analyst::normalize::strip_fences;
/// assert_eq!(strip_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
/// assert_eq!(strip_fences("  {\"a\":1} "), "{\"a\":1}");
/// ```
pub fn strip_fences(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix(FENCE_JSON) {
        s = rest;
    } else if let Some(rest) = s.strip_prefix(FENCE) {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix(FENCE) {
        s = rest;
    }
    s.trim()
}

/// Fence-strips and parses the model output; the parsed value is returned as-is.
///
/// # Errors
/// [`AnalystError::Parse`] if the remainder is not valid JSON.
pub fn normalize_structured(raw: &str) -> Result<Value, AnalystError> {
    serde_json::from_str(strip_fences(raw)).map_err(AnalystError::Parse)
}

/// Prose answers are only trimmed.
pub fn normalize_prose(raw: &str) -> String {
    raw.trim().to_string()
}

/// Display text for a failed prose answer.
///
/// Quota errors (by status code, or a `429` anywhere in the description)
/// become [`RATE_LIMIT_ADVISORY`]; everything else is `error: <description>`.
pub fn prose_failure_message(err: &AnalystError) -> String {
    let description = err.to_string();
    if err.kind() == ErrorKind::QuotaExceeded || description.contains("429") {
        RATE_LIMIT_ADVISORY.to_string()
    } else {
        format!("error: {description}")
    }
}
