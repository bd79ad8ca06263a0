use std::{collections::HashMap, sync::Arc};

use llm_service::error_handler::env_opt;
use policy_analyst::{Conversation, PolicyAnalyst};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error_handler::{AppError, AppResult};

/// Default bind address when `API_ADDRESS` is unset.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8080";

/// Default request body limit for uploads (20 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Default number of live sessions when `API_MAX_SESSIONS` is unset.
pub const DEFAULT_MAX_SESSIONS: usize = 256;

/// HTTP server settings.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub address: String,
    pub max_upload_bytes: usize,
    /// Live sessions kept at once; creation beyond this is refused.
    pub max_sessions: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

impl ApiConfig {
    /// Reads `API_ADDRESS`, `API_MAX_UPLOAD_BYTES` and `API_MAX_SESSIONS`.
    pub fn from_env() -> AppResult<Self> {
        let mut cfg = Self::default();
        if let Some(address) = env_opt("API_ADDRESS") {
            cfg.address = address;
        }
        if let Some(v) = env_opt("API_MAX_UPLOAD_BYTES") {
            cfg.max_upload_bytes = v.trim().parse().map_err(|_| AppError::InvalidEnv {
                var: "API_MAX_UPLOAD_BYTES",
                reason: format!("expected a byte count, got `{v}`"),
            })?;
        }
        if let Some(v) = env_opt("API_MAX_SESSIONS") {
            cfg.max_sessions = match v.trim().parse() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(AppError::InvalidEnv {
                        var: "API_MAX_SESSIONS",
                        reason: format!("expected a positive count, got `{v}`"),
                    });
                }
            };
        }
        Ok(cfg)
    }
}

/// One session; the mutex serializes a turn (summary, answer, transcript).
pub type SessionHandle = Arc<Mutex<Conversation>>;

/// Shared state for all HTTP handlers.
pub struct AppState {
    pub analyst: Arc<PolicyAnalyst>,
    pub config: ApiConfig,
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
}

impl AppState {
    pub fn new(analyst: Arc<PolicyAnalyst>, config: ApiConfig) -> Self {
        Self {
            analyst,
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Registers an empty session.
    ///
    /// # Errors
    /// [`AppError::SessionLimit`] when `config.max_sessions` are already live.
    pub async fn create_session(&self) -> AppResult<Uuid> {
        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.config.max_sessions {
            warn!(limit = self.config.max_sessions, "session limit reached");
            return Err(AppError::SessionLimit(self.config.max_sessions));
        }
        let id = Uuid::new_v4();
        sessions.insert(id, Arc::new(Mutex::new(Conversation::new())));
        debug!(session = %id, live = sessions.len(), "session created");
        Ok(id)
    }

    pub async fn session(&self, id: Uuid) -> AppResult<SessionHandle> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(AppError::SessionNotFound(id))
    }

    /// `true` if the session existed.
    pub async fn remove_session(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_service::{GenerateFuture, LlmModelConfig, LlmProvider, TextGenerator};
    use policy_analyst::AnalystConfig;

    struct Silent;

    impl TextGenerator for Silent {
        fn model(&self) -> &str {
            "silent"
        }

        fn generate<'a>(&'a self, _prompt: &'a str) -> GenerateFuture<'a> {
            Box::pin(async { Ok(String::new()) })
        }
    }

    fn state(max_sessions: usize) -> AppState {
        let cfg = AnalystConfig::new(LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "llama3.1:8b".into(),
            endpoint: "http://localhost:11434".into(),
            api_key: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: None,
        });
        let analyst = PolicyAnalyst::with_generator(cfg, Arc::new(Silent));
        AppState::new(
            Arc::new(analyst),
            ApiConfig {
                max_sessions,
                ..ApiConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn session_limit_refuses_until_one_is_removed() {
        let state = state(2);
        let first = state.create_session().await.unwrap();
        state.create_session().await.unwrap();

        let err = state.create_session().await.unwrap_err();
        assert!(matches!(err, AppError::SessionLimit(2)));
        assert_eq!(state.session_count().await, 2);

        assert!(state.remove_session(first).await);
        assert!(state.create_session().await.is_ok());
        assert!(state.session(first).await.is_err());
    }
}
