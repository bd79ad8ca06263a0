//! Google Gemini client for single-turn text generation.
//!
//! Minimal, non-streaming wrapper around the Generative Language REST API:
//! - POST {endpoint}/v1beta/models/{model}:generateContent
//!
//! The credential travels in the `x-goog-api-key` header so it never appears
//! in URLs or logs. A missing key does not prevent construction: the request
//! is sent without it and the upstream rejection surfaces as
//! [`LlmError::HttpStatus`]. Flows that must not call out without a key check
//! [`LlmModelConfig::has_credential`] first.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{LlmError, make_snippet},
};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Thin client for the Gemini API.
///
/// Keeps a preconfigured `reqwest::Client` (default headers, optional timeout).
#[derive(Debug)]
pub struct GeminiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_generate: String,
}

impl GeminiService {
    /// Creates a new [`GeminiService`] from the given config.
    ///
    /// # Errors
    /// - [`LlmError::InvalidProvider`] if `cfg.provider` is not Gemini
    /// - [`LlmError::InvalidEndpoint`] if `cfg.endpoint` is invalid
    /// - [`LlmError::Decode`] if the API key cannot be used as a header value
    /// - [`LlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, LlmError> {
        if cfg.provider != LlmProvider::Gemini {
            return Err(LlmError::InvalidProvider { expected: "gemini" });
        }

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(LlmError::InvalidEndpoint(cfg.endpoint.clone()));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        match cfg.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            Some(key) => {
                let mut value = header::HeaderValue::from_str(key.trim())
                    .map_err(|e| LlmError::Decode(format!("invalid API key header: {e}")))?;
                value.set_sensitive(true);
                headers.insert(API_KEY_HEADER, value);
            }
            None => warn!(
                model = %cfg.model,
                "GeminiService built without an API key; calls will be rejected upstream"
            ),
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(secs) = cfg.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        let url_generate = format!(
            "{}/v1beta/models/{}:generateContent",
            endpoint.trim_end_matches('/'),
            cfg.model
        );

        info!(
            provider = %cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = ?cfg.timeout_secs,
            "GeminiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_generate,
        })
    }

    /// Model identifier this client sends.
    pub fn model(&self) -> &str {
        &self.cfg.model
    }

    /// Performs a single **non-streaming** `generateContent` call.
    ///
    /// The prompt is sent as the only user turn; all text parts of the first
    /// candidate are concatenated.
    ///
    /// # Errors
    /// - [`LlmError::HttpStatus`] for non-2xx responses (429 for quota)
    /// - [`LlmError::HttpTransport`] for client/network failures
    /// - [`LlmError::Timeout`] when `timeout_secs` elapses
    /// - [`LlmError::Decode`] if the JSON cannot be parsed
    /// - [`LlmError::EmptyResponse`] if no candidate carries text
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let started = Instant::now();
        let body = GenerateContentRequest::from_cfg(&self.cfg, prompt);

        debug!(prompt_len = prompt.len(), "POST {}", self.url_generate);

        let resp = self
            .client
            .post(&self.url_generate)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::from_request(e, self.cfg.timeout_secs))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_generate.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                latency_ms = started.elapsed().as_millis(),
                "Gemini generateContent returned non-success status"
            );

            return Err(LlmError::HttpStatus {
                status,
                url,
                snippet,
            });
        }

        let out: GenerateContentResponse = resp.json().await.map_err(|e| {
            error!(
                error = %e,
                latency_ms = started.elapsed().as_millis(),
                "failed to decode generateContent response"
            );
            LlmError::Decode(format!(
                "serde error: {e}; expected `candidates[0].content.parts[].text`"
            ))
        })?;

        let text = out.first_text().ok_or_else(|| LlmError::EmptyResponse {
            model: self.cfg.model.clone(),
        })?;

        info!(
            latency_ms = started.elapsed().as_millis(),
            response_len = text.len(),
            "generateContent completed"
        );

        Ok(text)
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl<'a> GenerateContentRequest<'a> {
    fn from_cfg(cfg: &LlmModelConfig, prompt: &'a str) -> Self {
        let generation_config = GenerationConfig {
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_output_tokens: cfg.max_tokens,
        };
        let generation_config = (!generation_config.is_empty()).then_some(generation_config);

        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config,
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

impl GenerationConfig {
    fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.top_p.is_none() && self.max_output_tokens.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate that has any.
    fn first_text(self) -> Option<String> {
        self.candidates.into_iter().find_map(|c| {
            let text: String = c
                .content?
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect();
            (!text.is_empty()).then_some(text)
        })
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Gemini,
            model: "gemini-1.5-flash".into(),
            endpoint: "https://generativelanguage.googleapis.com/".into(),
            api_key: Some("test-key".into()),
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: None,
        }
    }

    #[test]
    fn builds_generate_url_from_endpoint_and_model() {
        let svc = GeminiService::new(cfg()).unwrap();
        assert_eq!(
            svc.url_generate,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn construction_without_key_is_allowed() {
        let mut c = cfg();
        c.api_key = None;
        assert!(GeminiService::new(c).is_ok());
    }

    #[test]
    fn request_omits_empty_generation_config() {
        let c = cfg();
        let body = serde_json::to_value(GenerateContentRequest::from_cfg(&c, "question")).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "question");
        assert_eq!(body["contents"][0]["role"], "user");
        assert!(body.get("generationConfig").is_none());

        let mut c = cfg();
        c.max_tokens = Some(128);
        let body = serde_json::to_value(GenerateContentRequest::from_cfg(&c, "q")).unwrap();
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 128);
    }

    #[test]
    fn response_text_joins_parts_of_first_candidate() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"world"}]}}]}"#;
        let out: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(out.first_text().as_deref(), Some("Hello world"));

        let empty: GenerateContentResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(empty.first_text().is_none());
    }
}
