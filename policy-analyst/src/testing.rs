//! Test doubles for [`TextGenerator`].

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use llm_service::error_handler::StatusCode;
use llm_service::{GenerateFuture, LlmError, TextGenerator};

/// Replies with a fixed text and counts calls.
pub struct Canned {
    reply: String,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl Canned {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl TextGenerator for Canned {
    fn model(&self) -> &str {
        "canned"
    }

    fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        })
    }
}

/// How [`Failing`] fails.
pub enum Failure {
    Status(StatusCode),
    Text(&'static str),
}

/// Always fails; counts calls.
pub struct Failing {
    failure: Failure,
    calls: AtomicUsize,
}

impl Failing {
    pub fn new(failure: Failure) -> Self {
        Self {
            failure,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextGenerator for Failing {
    fn model(&self) -> &str {
        "failing"
    }

    fn generate<'a>(&'a self, _prompt: &'a str) -> GenerateFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(match &self.failure {
                Failure::Status(status) => LlmError::HttpStatus {
                    status: *status,
                    url: "https://llm.test/generate".into(),
                    snippet: "upstream refused".into(),
                },
                Failure::Text(text) => LlmError::Decode((*text).to_string()),
            })
        })
    }
}

/// Echoes the last prompt line after a delay read from it.
///
/// A prompt ending in `"<ms>:<label>"` sleeps `ms` milliseconds and returns
/// `"<label>"`; a label of `fail` returns an error instead.
pub struct Delayed;

impl TextGenerator for Delayed {
    fn model(&self) -> &str {
        "delayed"
    }

    fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a> {
        Box::pin(async move {
            let last = prompt.lines().last().unwrap_or_default();
            let (ms, label) = last.split_once(':').unwrap_or(("0", last));
            tokio::time::sleep(Duration::from_millis(ms.parse().unwrap_or(0))).await;
            if label == "fail" {
                return Err(LlmError::Decode("summary failed".into()));
            }
            Ok(format!("  {label}  "))
        })
    }
}
