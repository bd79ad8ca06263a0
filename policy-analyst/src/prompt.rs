//! Prompt builder: fixed instruction templates + budgeted context.
//!
//! Templates use plain substitution. Question and context are not escaped,
//! so text that imitates the template can confuse the model; this is accepted.

use std::{fmt, str::FromStr};

use crate::error::AnalystError;

/// Maximum number of context characters admitted into a prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContextBudget {
    /// 2,000 characters; fits small-context models.
    Compact,
    /// 25,000 characters.
    #[default]
    Extended,
    /// No truncation.
    Unbounded,
    /// Explicit character count.
    Chars(usize),
}

impl ContextBudget {
    pub const COMPACT_CHARS: usize = 2_000;
    pub const EXTENDED_CHARS: usize = 25_000;

    pub fn chars(self) -> usize {
        match self {
            ContextBudget::Compact => Self::COMPACT_CHARS,
            ContextBudget::Extended => Self::EXTENDED_CHARS,
            ContextBudget::Unbounded => usize::MAX,
            ContextBudget::Chars(n) => n,
        }
    }
}

impl fmt::Display for ContextBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextBudget::Compact => f.write_str("compact"),
            ContextBudget::Extended => f.write_str("extended"),
            ContextBudget::Unbounded => f.write_str("unbounded"),
            ContextBudget::Chars(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for ContextBudget {
    type Err = AnalystError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compact" => Ok(ContextBudget::Compact),
            "extended" => Ok(ContextBudget::Extended),
            "unbounded" | "none" => Ok(ContextBudget::Unbounded),
            other => other.parse::<usize>().map(ContextBudget::Chars).map_err(|_| {
                AnalystError::Config(format!(
                    "context budget must be compact, extended, unbounded or a number, got `{other}`"
                ))
            }),
        }
    }
}

/// Keeps at most `max_chars` characters; never splits a code point.
///
/// # Example
/// ```
/// use policy_analyst::prompt::truncate_chars;
/// assert_eq!(truncate_chars("Prämie", 3), "Prä");
/// assert_eq!(truncate_chars("abc", 10), "abc");
/// ```
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Structured-mode prompt: the model must reply with a single JSON object.
pub fn build_structured_prompt(context: &str, question: &str, budget: ContextBudget) -> String {
    let context = truncate_chars(context, budget.chars());
    format!(
        "You are an expert insurance analyst.
Given the policy context, decide whether the request in the question is covered.

Context:
{context}

Question:
{question}

Reply **only** with valid JSON, no prose before or after it:
{{
  \"decision\": \"Approved\" | \"Rejected\",
  \"justification\": \"<short reason>\",
  \"relevant_clauses\": [\"<excerpt>\", \"...\"]
}}"
    )
}

/// Prose-mode prompt: a plain conversational answer.
pub fn build_prose_prompt(context: &str, question: &str, budget: ContextBudget) -> String {
    let context = truncate_chars(context, budget.chars());
    format!(
        "You are a friendly insurance assistant helping a customer understand their policy.
Answer the question in plain, conversational language using only the policy text below.
Do not answer in JSON, do not include code or code blocks, and do not include links.
If the policy text does not cover the question, say so plainly.

Policy text:
{context}

Question:
{question}

Answer:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_parsing() {
        assert_eq!("compact".parse::<ContextBudget>().unwrap(), ContextBudget::Compact);
        assert_eq!(" Extended ".parse::<ContextBudget>().unwrap(), ContextBudget::Extended);
        assert_eq!("unbounded".parse::<ContextBudget>().unwrap().chars(), usize::MAX);
        assert_eq!("1500".parse::<ContextBudget>().unwrap(), ContextBudget::Chars(1500));
        assert!("lots".parse::<ContextBudget>().is_err());
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        let text = "ééééé";
        assert_eq!(truncate_chars(text, 2), "éé");
        assert_eq!(truncate_chars(text, 0), "");
        assert_eq!(truncate_chars(text, 5), text);
    }

    #[test]
    fn structured_prompt_embeds_budgeted_context_and_schema() {
        let context = "§".repeat(ContextBudget::COMPACT_CHARS + 500);
        let prompt = build_structured_prompt(&context, "Is it covered?", ContextBudget::Compact);

        assert_eq!(prompt.matches('§').count(), ContextBudget::COMPACT_CHARS);
        assert!(prompt.contains("Question:\nIs it covered?"));
        assert!(prompt.contains("\"decision\": \"Approved\" | \"Rejected\""));
        assert!(prompt.contains("\"justification\""));
        assert!(prompt.contains("\"relevant_clauses\""));
        assert!(prompt.contains("{\n"));
    }

    #[test]
    fn prose_prompt_forbids_json_code_and_links() {
        let prompt = build_prose_prompt("Covers surgery.", "Am I covered?", ContextBudget::Unbounded);
        assert!(prompt.contains("Covers surgery."));
        assert!(prompt.contains("Am I covered?"));
        assert!(prompt.contains("Do not answer in JSON"));
        assert!(prompt.contains("code"));
        assert!(prompt.contains("links"));
        assert!(!prompt.contains("relevant_clauses"));
    }

    #[test]
    fn question_is_not_truncated() {
        let question = "q".repeat(5_000);
        let prompt = build_structured_prompt("ctx", &question, ContextBudget::Chars(1));
        assert!(prompt.contains(&question));
        assert!(prompt.contains("Context:\nc\n"));
    }
}
