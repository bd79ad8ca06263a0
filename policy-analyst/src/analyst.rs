//! Answer flows over a shared [`TextGenerator`].
//!
//! Three boundary shapes are produced from the same typed core
//! ([`PolicyAnalyst::answer_structured`]):
//! - single-shot: `{"error": ...}` on any failure ([`PolicyAnalyst::analyze`])
//! - chat, structured: the fixed parse-failure record
//! - chat, prose: the failure text becomes the answer

use std::sync::Arc;

use llm_service::{LlmModelConfig, LlmService, TextGenerator};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::cfg::{AnalystConfig, AnswerMode, ContextSource};
use crate::conversation::{Conversation, Role, format_decision};
use crate::error::AnalystError;
use crate::ingest::{fingerprint, merge_documents, read_all};
use crate::normalize::{
    PolicyDecision, error_object, normalize_prose, normalize_structured, prose_failure_message,
};
use crate::prompt::{build_prose_prompt, build_structured_prompt};
use crate::summarize::summarise_all;

/// Returned by structured flows when the Gemini key is absent.
pub const MISSING_KEY_MESSAGE: &str = "GEMINI_API_KEY missing. Set environment variable.";

pub struct PolicyAnalyst {
    config: AnalystConfig,
    generator: Arc<dyn TextGenerator>,
}

impl PolicyAnalyst {
    /// Builds the HTTP client for the configured provider.
    pub fn from_config(config: AnalystConfig) -> Result<Self, AnalystError> {
        let service = LlmService::new(config.llm.clone())?;
        Ok(Self::with_generator(config, Arc::new(service)))
    }

    /// Uses `generator` for every remote call.
    pub fn with_generator(config: AnalystConfig, generator: Arc<dyn TextGenerator>) -> Self {
        info!(
            provider = %config.llm.provider,
            model = %config.llm.model,
            source = %config.context_source,
            mode = %config.answer_mode,
            budget = %config.context_budget,
            "policy analyst ready"
        );
        Self { config, generator }
    }

    pub fn config(&self) -> &AnalystConfig {
        &self.config
    }

    pub fn llm_config(&self) -> &LlmModelConfig {
        &self.config.llm
    }

    pub fn generator(&self) -> &dyn TextGenerator {
        self.generator.as_ref()
    }

    fn require_credential(&self) -> Result<(), AnalystError> {
        if self.config.llm.has_credential() {
            return Ok(());
        }
        let message = match self.config.llm.provider.api_key_var() {
            Some("GEMINI_API_KEY") | None => MISSING_KEY_MESSAGE.to_string(),
            Some(var) => format!("{var} missing. Set environment variable."),
        };
        Err(AnalystError::MissingCredential(message))
    }

    /// Structured answer as a typed result.
    ///
    /// # Errors
    /// - [`AnalystError::MissingCredential`] before any remote call
    /// - [`AnalystError::Llm`] when the call fails
    /// - [`AnalystError::Parse`] when the reply is not JSON
    #[instrument(skip_all, fields(question_chars = question.chars().count()))]
    pub async fn answer_structured(
        &self,
        context: &str,
        question: &str,
    ) -> Result<Value, AnalystError> {
        self.require_credential()?;
        let prompt = build_structured_prompt(context, question, self.config.context_budget);
        let raw = self.generator.generate(&prompt).await?;
        debug!(reply_chars = raw.chars().count(), "structured reply received");
        normalize_structured(&raw)
    }

    /// Single-shot analysis: any failure becomes `{"error": "<description>"}`.
    pub async fn analyze(&self, context: &str, question: &str) -> Value {
        match self.answer_structured(context, question).await {
            Ok(value) => value,
            Err(e) => {
                warn!(kind = ?e.kind(), error = %e, "analysis failed");
                error_object(e.to_string())
            }
        }
    }

    /// Chat variant of the structured answer: any failure becomes
    /// [`PolicyDecision::parse_failure`].
    pub async fn answer_structured_or_fallback(&self, context: &str, question: &str) -> Value {
        match self.answer_structured(context, question).await {
            Ok(value) => value,
            Err(e) => {
                warn!(kind = ?e.kind(), error = %e, "structured answer failed");
                PolicyDecision::parse_failure().to_value()
            }
        }
    }

    /// Prose answer. Failures are returned as display text, not as errors.
    ///
    /// No credential check: the call is attempted and whatever fails is shown.
    #[instrument(skip_all, fields(question_chars = question.chars().count()))]
    pub async fn answer_prose(&self, context: &str, question: &str) -> String {
        let prompt = build_prose_prompt(context, question, self.config.context_budget);
        match self.generator.generate(&prompt).await {
            Ok(raw) => normalize_prose(&raw),
            Err(e) => {
                let e = AnalystError::from(e);
                warn!(kind = ?e.kind(), error = %e, "prose answer failed");
                prose_failure_message(&e)
            }
        }
    }

    /// Context for the next answer, per the configured [`ContextSource`].
    ///
    /// Summaries are cached on the conversation by upload fingerprint, so a
    /// follow-up question on the same uploads makes no summary calls.
    pub async fn context_for(&self, conv: &mut Conversation) -> Result<String, AnalystError> {
        if !conv.has_documents() {
            return Err(AnalystError::NoDocuments);
        }

        match self.config.context_source {
            ContextSource::Corpus => Ok(merge_documents(conv.documents_mut(), true)?),
            ContextSource::Summary => {
                let fp = fingerprint(conv.documents_mut())?;
                if let Some(cached) = conv.summary_for(&fp) {
                    debug!("summary cache hit");
                    return Ok(cached.to_string());
                }
                let texts = read_all(conv.documents_mut())?;
                let summary =
                    summarise_all(self.generator.as_ref(), &texts, self.config.summary).await?;
                conv.store_summary(fp, summary.clone());
                Ok(summary)
            }
        }
    }

    /// One interactive turn: resolves the context, records the question,
    /// answers in `mode` and records the displayed answer.
    ///
    /// A structured turn without a credential skips the summaries and answers
    /// with [`PolicyDecision::parse_failure`], so no remote call is made.
    ///
    /// # Errors
    /// [`AnalystError::NoDocuments`], read errors and summary failures. Answer
    /// failures are folded into the returned display text.
    #[instrument(skip_all, fields(mode = %mode, turn = conv.transcript().len()))]
    pub async fn chat(
        &self,
        conv: &mut Conversation,
        question: &str,
        mode: AnswerMode,
    ) -> Result<String, AnalystError> {
        if !conv.has_documents() {
            return Err(AnalystError::NoDocuments);
        }

        if matches!(mode, AnswerMode::Structured) {
            if let Err(e) = self.require_credential() {
                warn!(error = %e, "structured turn without credential");
                let answer = format_decision(&PolicyDecision::parse_failure());
                conv.push(Role::User, question);
                conv.push(Role::Assistant, answer.clone());
                return Ok(answer);
            }
        }

        let context = self.context_for(conv).await?;
        conv.push(Role::User, question);

        let answer = match mode {
            AnswerMode::Structured => {
                let value = self.answer_structured_or_fallback(&context, question).await;
                format_decision(&PolicyDecision::from_value(&value))
            }
            AnswerMode::Prose => self.answer_prose(&context, question).await,
        };

        conv.push(Role::Assistant, answer.clone());
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::Document;
    use crate::normalize::RATE_LIMIT_ADVISORY;
    use crate::testing::{Canned, Failing, Failure};
    use llm_service::LlmProvider;
    use llm_service::error_handler::StatusCode;
    use serde_json::json;

    const SURGERY: &str = "```json\n{\"decision\":\"Approved\",\"justification\":\"Within surgery limit\",\"relevant_clauses\":[\"Covers surgery up to $50,000\"]}\n```";

    fn config(api_key: Option<&str>) -> AnalystConfig {
        AnalystConfig::new(LlmModelConfig {
            provider: LlmProvider::Gemini,
            model: "gemini-1.5-flash".into(),
            endpoint: "https://generativelanguage.googleapis.com".into(),
            api_key: api_key.map(str::to_string),
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: None,
        })
    }

    fn analyst<G: TextGenerator + 'static>(cfg: AnalystConfig, generator: Arc<G>) -> PolicyAnalyst {
        PolicyAnalyst::with_generator(cfg, generator)
    }

    #[tokio::test]
    async fn missing_key_short_circuits_without_calls() {
        let generator = Arc::new(Canned::new(SURGERY));
        let a = analyst(config(None), generator.clone());

        let out = a.analyze("ctx", "q").await;
        assert_eq!(out, json!({"error": MISSING_KEY_MESSAGE}));
        assert_eq!(out.as_object().unwrap().len(), 1);
        assert_eq!(generator.calls(), 0);

        let err = a.answer_structured("ctx", "q").await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn structured_chat_without_key_makes_no_calls() {
        let generator = Arc::new(Canned::new(SURGERY));
        let a = analyst(config(None), generator.clone());
        let mut conv = Conversation::with_documents(vec![
            Document::named("a.txt", "Covers surgery up to $50,000."),
            Document::named("b.txt", "Dental excluded."),
        ]);

        let answer = a.chat(&mut conv, "Knee surgery?", AnswerMode::Structured).await.unwrap();
        assert_eq!(answer, format_decision(&PolicyDecision::parse_failure()));
        assert!(answer.starts_with("**Decision:** Error"));
        assert_eq!(generator.calls(), 0);
        assert_eq!(conv.transcript().len(), 2);

        let mut empty = Conversation::new();
        let err = a.chat(&mut empty, "q", AnswerMode::Structured).await.unwrap_err();
        assert!(matches!(err, AnalystError::NoDocuments));
    }

    #[tokio::test]
    async fn surgery_example_end_to_end() {
        let generator = Arc::new(Canned::new(SURGERY));
        let a = analyst(config(Some("key")), generator.clone());

        let out = a
            .analyze(
                "Policy covers surgery up to $50,000.",
                "Is a $30,000 knee surgery covered?",
            )
            .await;
        assert_eq!(
            out,
            json!({
                "decision": "Approved",
                "justification": "Within surgery limit",
                "relevant_clauses": ["Covers surgery up to $50,000"]
            })
        );
        assert_eq!(generator.calls(), 1);
        assert!(generator.prompts()[0].contains("Is a $30,000 knee surgery covered?"));
    }

    #[tokio::test]
    async fn remote_failure_becomes_error_object() {
        let generator = Arc::new(Failing::new(Failure::Text("connection reset")));
        let a = analyst(config(Some("key")), generator);
        let out = a.analyze("ctx", "q").await;
        assert!(out["error"].as_str().unwrap().contains("connection reset"));
    }

    #[tokio::test]
    async fn non_json_in_structured_chat_yields_fixed_shape() {
        let generator = Arc::new(Canned::new("I think it is covered."));
        let a = analyst(config(Some("key")), generator);
        assert_eq!(
            a.answer_structured_or_fallback("ctx", "q").await,
            json!({"decision": "Error", "justification": "Parse failure", "relevant_clauses": []})
        );
    }

    #[tokio::test]
    async fn prose_quota_failure_shows_advisory() {
        let by_status = analyst(
            config(Some("key")),
            Arc::new(Failing::new(Failure::Status(StatusCode::TOO_MANY_REQUESTS))),
        );
        assert_eq!(by_status.answer_prose("ctx", "q").await, RATE_LIMIT_ADVISORY);

        let by_text = analyst(
            config(Some("key")),
            Arc::new(Failing::new(Failure::Text("429 quota exhausted"))),
        );
        assert_eq!(by_text.answer_prose("ctx", "q").await, RATE_LIMIT_ADVISORY);
    }

    #[tokio::test]
    async fn prose_attempts_the_call_without_a_key() {
        let generator = Arc::new(Canned::new("  Yes, surgery is covered.  "));
        let a = analyst(config(None), generator.clone());
        assert_eq!(a.answer_prose("ctx", "q").await, "Yes, surgery is covered.");
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn chat_caches_summary_across_turns() {
        let generator = Arc::new(Canned::new(SURGERY));
        let a = analyst(config(Some("key")), generator.clone());
        let mut conv = Conversation::with_documents(vec![
            Document::named("a.txt", "Covers surgery up to $50,000."),
            Document::named("b.txt", "Dental excluded."),
        ]);

        let first = a.chat(&mut conv, "Knee surgery?", AnswerMode::Structured).await.unwrap();
        assert!(first.starts_with("**Decision:** Approved"));
        assert!(first.ends_with("- Covers surgery up to $50,000"));
        assert_eq!(generator.calls(), 3);

        a.chat(&mut conv, "And dental?", AnswerMode::Structured).await.unwrap();
        assert_eq!(generator.calls(), 4);

        let roles: Vec<Role> = conv.transcript().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
        assert_eq!(conv.transcript()[2].content, "And dental?");
    }

    #[tokio::test]
    async fn chat_over_raw_corpus_tags_document_names() {
        let generator = Arc::new(Canned::new("Covered."));
        let mut cfg = config(Some("key"));
        cfg.context_source = ContextSource::Corpus;
        let a = analyst(cfg, generator.clone());
        let mut conv = Conversation::with_documents(vec![Document::named("policy.txt", "Surgery.")]);

        let answer = a.chat(&mut conv, "Covered?", AnswerMode::Prose).await.unwrap();
        assert_eq!(answer, "Covered.");
        assert_eq!(generator.calls(), 1);
        assert!(generator.prompts()[0].contains("--- policy.txt ---\nSurgery."));
    }

    #[tokio::test]
    async fn chat_without_documents_is_rejected() {
        let generator = Arc::new(Canned::new("unused"));
        let a = analyst(config(Some("key")), generator.clone());
        let mut conv = Conversation::new();
        let err = a.chat(&mut conv, "q", AnswerMode::Prose).await.unwrap_err();
        assert!(matches!(err, AnalystError::NoDocuments));
        assert!(conv.transcript().is_empty());
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn summary_failure_propagates_from_chat() {
        let generator = Arc::new(Failing::new(Failure::Text("boom")));
        let a = analyst(config(Some("key")), generator.clone());
        let mut conv = Conversation::with_documents(vec![Document::named("a.txt", "x")]);
        let err = a.chat(&mut conv, "q", AnswerMode::Structured).await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Transport);
        assert!(conv.transcript().is_empty());
        assert_eq!(generator.calls(), 1);
    }
}
