//! Session lifecycle and transcript.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::info;
use uuid::Uuid;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::{AppError, AppResult},
    routes::sessions::session_dto::{SessionCreated, TranscriptResponse},
};

/// POST /sessions
pub async fn create_session_route(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    let session_id = state.create_session().await?;
    info!(session = %session_id, "create_session_route: created");
    Ok(ApiResponse::success(SessionCreated { session_id })
        .into_response_with_status(StatusCode::CREATED))
}

/// DELETE /sessions/{id}
pub async fn delete_session_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    if state.remove_session(id).await {
        info!(session = %id, "delete_session_route: removed");
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Err(AppError::SessionNotFound(id))
    }
}

/// GET /sessions/{id}/transcript
pub async fn transcript_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let session = state.session(id).await?;
    let messages = session.lock().await.transcript().to_vec();
    Ok(ApiResponse::success(TranscriptResponse {
        session_id: id,
        messages,
    })
    .into_ok())
}
