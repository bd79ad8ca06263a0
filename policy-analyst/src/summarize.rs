//! Per-document summaries requested concurrently from the model.

use futures::future::try_join_all;
use llm_service::TextGenerator;
use tracing::{debug, instrument};

use crate::error::AnalystError;
use crate::prompt::truncate_chars;

/// Input and output bounds for one summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryLimits {
    /// Characters of document text sent to the model.
    pub input_chars: usize,
    /// Target summary length, in words (a hint for the model, not enforced).
    pub words: usize,
}

impl SummaryLimits {
    pub const DEFAULT_INPUT_CHARS: usize = 25_000;
    pub const DEFAULT_WORDS: usize = 120;
}

impl Default for SummaryLimits {
    fn default() -> Self {
        Self {
            input_chars: Self::DEFAULT_INPUT_CHARS,
            words: Self::DEFAULT_WORDS,
        }
    }
}

pub fn summary_prompt(text: &str, limits: SummaryLimits) -> String {
    format!(
        "Ultra-compact summary ({} words) of coverages & exclusions:\n{}",
        limits.words,
        truncate_chars(text, limits.input_chars)
    )
}

/// One remote call; the reply is trimmed.
pub async fn summarise(
    generator: &dyn TextGenerator,
    text: &str,
    limits: SummaryLimits,
) -> Result<String, AnalystError> {
    let prompt = summary_prompt(text, limits);
    let reply = generator.generate(&prompt).await?;
    Ok(reply.trim().to_string())
}

/// Summarises every text concurrently and joins the results in input order,
/// separated by a blank line.
///
/// All calls start together with no local limit. The first failure aborts the
/// batch; calls still in flight are dropped.
#[instrument(skip_all, fields(documents = texts.len(), model = generator.model()))]
pub async fn summarise_all<S: AsRef<str>>(
    generator: &dyn TextGenerator,
    texts: &[S],
    limits: SummaryLimits,
) -> Result<String, AnalystError> {
    let calls = texts
        .iter()
        .map(|t| summarise(generator, t.as_ref(), limits));
    let summaries = try_join_all(calls).await?;

    let joined = summaries.join("\n\n");
    debug!(summary_chars = joined.chars().count(), "summaries joined");
    Ok(joined)
}
