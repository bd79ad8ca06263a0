use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    response::Response,
};
use policy_analyst::{Document, ingest::is_accepted_file};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::{AppError, AppResult},
    routes::sessions::session_dto::{UploadResponse, UploadedDocument},
};

/// POST /sessions/{id}/documents
///
/// Every multipart field with a file name is an upload. The accepted set
/// replaces the session's previous uploads and invalidates its summary;
/// the transcript is kept.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/sessions/$ID/documents \
///   -F files=@policy.txt -F files=@schedule.pdf
/// ```
pub async fn upload_documents_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let session = state.session(id).await?;

    let mut documents = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            debug!(field = ?field.name(), "upload_documents_route: skipping non-file field");
            continue;
        };
        if !is_accepted_file(&file_name) {
            return Err(AppError::UnsupportedFile(file_name));
        }
        let data = field.bytes().await?;
        debug!(file = %file_name, bytes = data.len(), "upload_documents_route: received");
        documents.push(Document::named(file_name, data.to_vec()));
    }

    if documents.is_empty() {
        return Err(AppError::BadRequest("no files in multipart body".into()));
    }

    let listed = documents
        .iter()
        .map(|d| UploadedDocument {
            name: d.name().unwrap_or_default().to_string(),
            bytes: d.len(),
        })
        .collect::<Vec<_>>();

    session.lock().await.replace_documents(documents);
    info!(session = %id, documents = listed.len(), "upload_documents_route: stored");

    Ok(ApiResponse::success(UploadResponse { documents: listed }).into_ok())
}
