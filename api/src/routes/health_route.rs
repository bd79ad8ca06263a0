use std::sync::Arc;

use axum::{extract::State, response::Response};
use serde::Serialize;

use crate::core::{app_state::AppState, http::response_envelope::ApiResponse};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub provider: String,
    pub model: String,
    /// `false` when the provider needs an API key and none is configured.
    pub credential_present: bool,
    pub sessions: usize,
}

/// GET /health
pub async fn health_route(State(state): State<Arc<AppState>>) -> Response {
    let llm = state.analyst.llm_config();
    let body = HealthResponse {
        ok: true,
        provider: llm.provider.to_string(),
        model: llm.model.clone(),
        credential_present: llm.has_credential(),
        sessions: state.session_count().await,
    };
    ApiResponse::success(body).into_ok()
}
