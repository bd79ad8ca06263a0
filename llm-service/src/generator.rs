//! Text-generation abstraction.

use std::{future::Future, pin::Pin};

use crate::error_handler::LlmError;

/// Boxed future returned by [`TextGenerator::generate`].
pub type GenerateFuture<'a> = Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>>;

/// Remote generative-model capability.
///
/// Takes a fully rendered prompt as its sole input (no chat history) and
/// returns the model's raw text. Implemented by [`crate::LlmService`];
/// implement it yourself to substitute a test double.
pub trait TextGenerator: Send + Sync {
    /// Model identifier used for calls (for logs and health output).
    fn model(&self) -> &str;

    /// Sends `prompt` and returns the response text unmodified.
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerateFuture<'a>;
}
