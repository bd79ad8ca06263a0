//! Per-session state: uploads, cached summary and the ordered transcript.

use serde::{Deserialize, Serialize};

use crate::ingest::Document;
use crate::normalize::PolicyDecision;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Summary of an upload set, valid while the set's fingerprint is unchanged.
#[derive(Debug, Clone)]
struct CachedSummary {
    fingerprint: String,
    text: String,
}

/// One user's session. Owned by the caller and handed to
/// [`crate::PolicyAnalyst::chat`] by `&mut`.
#[derive(Debug, Default)]
pub struct Conversation {
    documents: Vec<Document>,
    summary: Option<CachedSummary>,
    transcript: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            documents,
            ..Self::default()
        }
    }

    /// Swaps the upload set. The transcript is kept; the cached summary
    /// is dropped.
    pub fn replace_documents(&mut self, documents: Vec<Document>) {
        self.documents = documents;
        self.summary = None;
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub(crate) fn documents_mut(&mut self) -> &mut [Document] {
        &mut self.documents
    }

    pub fn has_documents(&self) -> bool {
        !self.documents.is_empty()
    }

    /// Cached summary text if it was computed for `fingerprint`.
    pub(crate) fn summary_for(&self, fingerprint: &str) -> Option<&str> {
        self.summary
            .as_ref()
            .filter(|s| s.fingerprint == fingerprint)
            .map(|s| s.text.as_str())
    }

    pub(crate) fn store_summary(&mut self, fingerprint: String, text: String) {
        self.summary = Some(CachedSummary { fingerprint, text });
    }

    pub fn has_cached_summary(&self) -> bool {
        self.summary.is_some()
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.transcript.push(ChatMessage {
            role,
            content: content.into(),
        });
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }
}

/// Markdown display string for a structured answer.
pub fn format_decision(decision: &PolicyDecision) -> String {
    let mut out = format!(
        "**Decision:** {}\n\n**Justification:** {}\n\n**Relevant Clauses:**",
        decision.decision, decision.justification
    );
    for clause in &decision.relevant_clauses {
        out.push_str("\n- ");
        out.push_str(clause);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_formatting() {
        let d = PolicyDecision {
            decision: "Approved".into(),
            justification: "Within surgery limit".into(),
            relevant_clauses: vec!["Covers surgery up to $50,000".into(), "Clause 4".into()],
        };
        assert_eq!(
            format_decision(&d),
            "**Decision:** Approved\n\n**Justification:** Within surgery limit\n\n\
             **Relevant Clauses:**\n- Covers surgery up to $50,000\n- Clause 4"
        );

        let empty = format_decision(&PolicyDecision::parse_failure());
        assert!(empty.ends_with("**Relevant Clauses:**"));
    }

    #[test]
    fn summary_cache_is_keyed_and_reset_on_new_uploads() {
        let mut conv = Conversation::with_documents(vec![Document::named("a.txt", "x")]);
        conv.store_summary("fp1".into(), "summary".into());
        assert_eq!(conv.summary_for("fp1"), Some("summary"));
        assert_eq!(conv.summary_for("fp2"), None);

        conv.push(Role::User, "hi");
        conv.replace_documents(vec![Document::named("b.txt", "y")]);
        assert!(!conv.has_cached_summary());
        assert_eq!(conv.transcript().len(), 1);
    }

    #[test]
    fn role_serializes_lowercase() {
        let msg = ChatMessage {
            role: Role::Assistant,
            content: "ok".into(),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            serde_json::json!({"role": "assistant", "content": "ok"})
        );
    }
}
