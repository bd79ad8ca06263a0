use policy_analyst::AnswerMode;
use serde::{Deserialize, Serialize};

/// Request payload for POST /sessions/{id}/ask.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    /// Natural language question about the uploaded policy.
    pub question: String,
    /// `structured` or `prose`; defaults to `QA_ANSWER_MODE`.
    #[serde(default)]
    pub mode: Option<AnswerMode>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    /// Display text; for structured mode the formatted decision.
    pub answer: String,
    pub mode: AnswerMode,
}
