//! Question answering over uploaded insurance-policy documents.
//!
//! Pipeline: [`ingest`] decodes uploads, [`summarize`] condenses them
//! (or the merged corpus is used as-is), [`prompt`] renders the question
//! with a bounded context, a [`TextGenerator`] answers, and [`normalize`]
//! turns the reply into a structured record or display text.
//!
//! [`PolicyAnalyst`] wires these together; [`Conversation`] holds a
//! session's uploads, cached summary and transcript.
//!
//! [`TextGenerator`]: llm_service::TextGenerator

pub mod analyst;
pub mod cfg;
pub mod conversation;
pub mod error;
pub mod eval;
pub mod ingest;
pub mod normalize;
pub mod progress;
pub mod prompt;
pub mod summarize;

#[cfg(test)]
mod testing;

pub use analyst::{MISSING_KEY_MESSAGE, PolicyAnalyst};
pub use cfg::{AnalystConfig, AnswerMode, ContextSource};
pub use conversation::{ChatMessage, Conversation, Role};
pub use error::{AnalystError, ErrorKind};
pub use ingest::Document;
pub use normalize::{PolicyDecision, RATE_LIMIT_ADVISORY};
pub use progress::{IndicatifProgress, NoopProgress, Progress};
pub use prompt::ContextBudget;
