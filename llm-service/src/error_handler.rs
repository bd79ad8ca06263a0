//! Unified error handling for `llm-service`.
//!
//! One top-level error type [`LlmError`] for the whole library, with config
//! problems grouped in [`ConfigError`]. Small env helpers return the unified
//! [`Result<T>`] alias.
//!
//! All messages include the suffix `[LLM Service]` to simplify attribution in logs.

pub use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, LlmError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `llm-service` crate.
///
/// Upstream HTTP failures keep their status code so callers can branch on it
/// (see [`LlmError::is_rate_limited`]) instead of inspecting message text.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LlmError {
    /// Configuration/validation errors.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The configured provider does not match the client being built.
    #[error("[LLM Service] invalid provider: expected {expected}")]
    InvalidProvider {
        /// Provider the client was built for.
        expected: &'static str,
    },

    /// Endpoint is empty or does not start with http/https.
    #[error("[LLM Service] invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Underlying HTTP transport error.
    #[error("[LLM Service] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),

    /// Upstream returned a non-successful HTTP status.
    #[error("[LLM Service] HTTP {status} from {url}: {snippet}")]
    HttpStatus {
        /// HTTP status code.
        status: StatusCode,
        /// Request URL (without credentials).
        url: String,
        /// Short snippet of the response body.
        snippet: String,
    },

    /// Response payload could not be decoded as expected.
    #[error("[LLM Service] decode error: {0}")]
    Decode(String),

    /// Upstream answered but produced no text.
    #[error("[LLM Service] empty response from model {model}")]
    EmptyResponse {
        /// Model identifier.
        model: String,
    },

    /// Operation exceeded the configured timeout.
    #[error("[LLM Service] operation timed out after {0:?}")]
    Timeout(Duration),
}

impl LlmError {
    /// HTTP status of the failed call, when the failure came from upstream.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            LlmError::HttpStatus { status, .. } => Some(*status),
            LlmError::HttpTransport(e) => e.status(),
            _ => None,
        }
    }

    /// Maps a failed request; client timeouts become [`LlmError::Timeout`].
    pub(crate) fn from_request(err: reqwest::Error, timeout_secs: Option<u64>) -> Self {
        match timeout_secs {
            Some(secs) if err.is_timeout() => LlmError::Timeout(Duration::from_secs(secs)),
            _ => LlmError::HttpTransport(err),
        }
    }

    /// `true` when upstream rejected the call with `429 Too Many Requests`.
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(StatusCode::TOO_MANY_REQUESTS)
    }
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Errors raised while loading or validating configuration.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[LLM Service] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (ports, limits, timeouts).
    #[error("[LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Variable name (e.g. `LLM_MAX_TOKENS`).
        var: &'static str,
        /// Human-readable reason (e.g. `expected u32`).
        reason: &'static str,
    },

    /// Unsupported provider in `LLM_KIND`.
    #[error("[LLM Service] unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Value had the wrong format (e.g. invalid URL).
    #[error("[LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        /// Variable name (e.g. `GEMINI_URL`).
        var: &'static str,
        /// Explanation.
        reason: &'static str,
    },

    /// Model name was empty.
    #[error("[LLM Service] model name must not be empty")]
    EmptyModel,
}

/* ------------------------------------------------------------------------- */
/* Env helpers (return unified `Result<T>`)                                  */
/* ------------------------------------------------------------------------- */

/// Fetches a required, non-empty environment variable.
///
/// # Errors
/// Returns [`LlmError::Config`] with [`ConfigError::MissingVar`] if the
/// variable is absent or empty.
pub fn must_env(name: &'static str) -> Result<String> {
    match env_opt(name) {
        Some(v) => Ok(v),
        None => Err(ConfigError::MissingVar(name).into()),
    }
}

/// Reads an optional environment variable; empty values count as unset.
pub fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parses an optional `u32` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but not a valid `u32`.
pub fn env_opt_u32(name: &'static str) -> Result<Option<u32>> {
    match env_opt(name) {
        Some(v) => v.trim().parse::<u32>().map(Some).map_err(|_| {
            LlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u32",
            })
        }),
        None => Ok(None),
    }
}

/// Parses an optional `u64` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but not a valid `u64`.
pub fn env_opt_u64(name: &'static str) -> Result<Option<u64>> {
    match env_opt(name) {
        Some(v) => v.trim().parse::<u64>().map(Some).map_err(|_| {
            LlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u64",
            })
        }),
        None => Ok(None),
    }
}

/* ------------------------------------------------------------------------- */
/* Validation helpers                                                        */
/* ------------------------------------------------------------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// # Errors
/// Returns [`ConfigError::InvalidFormat`] when the scheme is missing.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    let value = value.trim();
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}

/// Shortens an upstream body for logs and error messages.
pub fn make_snippet(text: &str) -> String {
    const MAX: usize = 240;
    let trimmed = text.trim();
    if trimmed.chars().count() <= MAX {
        trimmed.to_string()
    } else {
        let mut s: String = trimmed.chars().take(MAX).collect();
        s.push('…');
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_is_detected_from_status() {
        let err = LlmError::HttpStatus {
            status: StatusCode::TOO_MANY_REQUESTS,
            url: "https://example.test".into(),
            snippet: "quota".into(),
        };
        assert!(err.is_rate_limited());
        assert!(err.to_string().contains("429"));

        let other = LlmError::HttpStatus {
            status: StatusCode::BAD_GATEWAY,
            url: "https://example.test".into(),
            snippet: String::new(),
        };
        assert!(!other.is_rate_limited());
        assert!(!LlmError::Decode("x".into()).is_rate_limited());
    }

    #[test]
    fn endpoint_validation() {
        assert!(validate_http_endpoint("X", "https://a").is_ok());
        assert!(validate_http_endpoint("X", "ftp://a").is_err());
    }

    #[test]
    fn snippet_is_bounded() {
        let long = "a".repeat(1000);
        let s = make_snippet(&long);
        assert_eq!(s.chars().count(), 241);
        assert_eq!(make_snippet("  short  "), "short");
    }
}
