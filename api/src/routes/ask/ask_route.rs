use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    response::Response,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::{AppError, AppResult},
    routes::ask::ask_request::{AskRequest, AskResponse},
};

/// POST /sessions/{id}/ask
///
/// Runs one chat turn: the session is locked for the whole turn, so a
/// concurrent question on the same session waits for this one.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/sessions/$ID/ask \
///   -H 'content-type: application/json' \
///   -d '{"question":"Is a $30,000 knee surgery covered?","mode":"structured"}'
/// ```
pub async fn ask_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(body) = payload?;
    let question = body.question.trim();
    if question.is_empty() {
        return Err(AppError::BadRequest("question must not be empty".into()));
    }

    let mode = body
        .mode
        .unwrap_or(state.analyst.config().answer_mode);
    debug!(session = %id, %mode, "ask_route: start");

    let session = state.session(id).await?;
    let mut conversation = session.lock().await;
    let answer = state.analyst.chat(&mut conversation, question, mode).await?;

    info!(session = %id, %mode, answer_chars = answer.chars().count(), "ask_route: answered");
    Ok(ApiResponse::success(AskResponse { answer, mode }).into_ok())
}
