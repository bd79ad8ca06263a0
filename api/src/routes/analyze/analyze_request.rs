use serde::Deserialize;

/// Request payload for POST /analyze.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Policy text the question is judged against.
    pub context: String,
    pub question: String,
}
