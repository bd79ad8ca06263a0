use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::Response,
};
use tracing::debug;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::AppResult,
    routes::analyze::analyze_request::AnalyzeRequest,
};

/// POST /analyze
///
/// Single-shot structured analysis without a session. Failures are reported
/// in-band as `{"error": "..."}` inside `data`, like the evaluation harness sees them.
pub async fn analyze_route(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(body) = payload?;
    debug!(
        context_chars = body.context.chars().count(),
        "analyze_route: start"
    );
    let result = state.analyst.analyze(&body.context, &body.question).await;
    Ok(ApiResponse::success(result).into_ok())
}
