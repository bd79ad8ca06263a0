use axum::{
    extract::multipart::MultipartError,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use policy_analyst::{AnalystError, ErrorKind};
use thiserror::Error;
use tracing::error;

use crate::core::http::response_envelope::{ApiErrorDetail, ApiResponse};

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("invalid value for {var}: {reason}")]
    InvalidEnv { var: &'static str, reason: String },

    #[error(transparent)]
    Analyst(#[from] AnalystError),

    // --- IO / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("session {0} not found")]
    SessionNotFound(uuid::Uuid),

    #[error("session limit of {0} reached")]
    SessionLimit(usize),

    #[error("unsupported file `{0}`: only .txt and .pdf are accepted")]
    UnsupportedFile(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::SessionLimit(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::UnsupportedFile(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,

            AppError::Analyst(AnalystError::NoDocuments) => StatusCode::CONFLICT,
            AppError::Analyst(e) => match e.kind() {
                ErrorKind::Config => StatusCode::SERVICE_UNAVAILABLE,
                ErrorKind::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
                ErrorKind::Transport | ErrorKind::Parse => StatusCode::BAD_GATEWAY,
                ErrorKind::Io => StatusCode::INTERNAL_SERVER_ERROR,
            },

            // startup-only
            AppError::InvalidEnv { .. } | AppError::Bind(_) | AppError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidEnv { .. } => "INVALID_ENV",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::SessionNotFound(_) => "NOT_FOUND",
            AppError::SessionLimit(_) => "SESSION_LIMIT",
            AppError::UnsupportedFile(_) => "UNSUPPORTED_FILE",

            AppError::Analyst(AnalystError::NoDocuments) => "NO_DOCUMENTS",
            AppError::Analyst(e) => match e.kind() {
                ErrorKind::Config => "CONFIG_ERROR",
                ErrorKind::QuotaExceeded => "QUOTA_EXCEEDED",
                ErrorKind::Transport => "UPSTREAM_ERROR",
                ErrorKind::Parse => "PARSE_ERROR",
                ErrorKind::Io => "IO_ERROR",
            },
        }
    }

    fn details(&self) -> Vec<ApiErrorDetail> {
        match self {
            AppError::Analyst(AnalystError::NoDocuments) => vec![ApiErrorDetail::hint(
                "Upload documents to /sessions/{id}/documents first.",
            )],
            AppError::SessionLimit(_) => vec![ApiErrorDetail::hint(
                "Delete finished sessions with DELETE /sessions/{id}.",
            )],
            AppError::UnsupportedFile(name) => vec![ApiErrorDetail::at(
                name.clone(),
                "Accepted extensions: .txt, .pdf",
            )],
            _ => Vec::new(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = self.error_code(), error = %self, "request failed");
        }
        ApiResponse::<()>::error(self.error_code(), self.to_string(), self.details())
            .into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::BadRequest(format!("failed to read multipart body: {}", err.body_text()))
    }
}
