//! Typed error for the policy-analyst crate.

use llm_service::LlmError;
use thiserror::Error;

/// Coarse error classes callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing credential or invalid settings, detected before any call.
    Config,
    /// The remote call failed (network, HTTP status, undecodable payload).
    Transport,
    /// The remote service refused the call because of quota (HTTP 429).
    QuotaExceeded,
    /// The model answered with text that is not valid JSON.
    Parse,
    /// Local input could not be read (uploads, evaluation files).
    Io,
}

#[derive(Debug, Error)]
pub enum AnalystError {
    /// A required credential is absent; no remote call was made.
    #[error("{0}")]
    MissingCredential(String),

    /// Invalid configuration value.
    #[error("config error: {0}")]
    Config(String),

    /// A question was asked before any document was uploaded.
    #[error("no documents uploaded")]
    NoDocuments,

    /// Failure reported by the remote generation service.
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// Model output is not JSON after fence stripping.
    #[error("response is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    /// A row of an evaluation file is malformed.
    #[error("line {line}: {source}")]
    EvalRow {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Local I/O.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalystError {
    /// Classifies the error; quota is recognised from the HTTP status code.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalystError::MissingCredential(_)
            | AnalystError::Config(_)
            | AnalystError::NoDocuments => ErrorKind::Config,
            AnalystError::Llm(e) if e.is_rate_limited() => ErrorKind::QuotaExceeded,
            AnalystError::Llm(_) => ErrorKind::Transport,
            AnalystError::Parse(_) | AnalystError::EvalRow { .. } => ErrorKind::Parse,
            AnalystError::Io(_) => ErrorKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_service::error_handler::StatusCode;

    #[test]
    fn quota_is_classified_by_status() {
        let err = AnalystError::from(LlmError::HttpStatus {
            status: StatusCode::TOO_MANY_REQUESTS,
            url: "https://example.test".into(),
            snippet: "Resource has been exhausted".into(),
        });
        assert_eq!(err.kind(), ErrorKind::QuotaExceeded);

        let err = AnalystError::from(LlmError::Decode("bad payload".into()));
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn parse_and_config_kinds() {
        let parse = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
        assert_eq!(AnalystError::Parse(parse).kind(), ErrorKind::Parse);
        assert_eq!(
            AnalystError::MissingCredential("k".into()).kind(),
            ErrorKind::Config
        );
    }
}
