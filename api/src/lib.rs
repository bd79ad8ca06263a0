//! HTTP surface for the policy assistant.
//!
//! | Route                           | Purpose                                  |
//! |---------------------------------|------------------------------------------|
//! | `GET /health`                   | provider, model and credential presence  |
//! | `POST /sessions`                | new session id                           |
//! | `DELETE /sessions/{id}`         | drop a session                           |
//! | `POST /sessions/{id}/documents` | multipart upload, replaces the set       |
//! | `POST /sessions/{id}/ask`       | one chat turn                            |
//! | `GET /sessions/{id}/transcript` | ordered messages                         |
//! | `POST /analyze`                 | single-shot structured answer            |

pub mod core {
    pub mod app_state;
    pub mod http {
        pub mod response_envelope;
    }
}

pub mod error_handler;

mod middleware_layer {
    pub mod json_extractor;
}

mod routes {
    pub mod analyze {
        pub mod analyze_request;
        pub mod analyze_route;
    }
    pub mod ask {
        pub mod ask_request;
        pub mod ask_route;
    }
    pub mod sessions {
        pub mod session_dto;
        pub mod session_routes;
        pub mod upload_documents_route;
    }
    pub mod health_route;
}

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
};
use tokio::signal;
use tracing::{info, warn};

pub use crate::core::app_state::{ApiConfig, AppState};
pub use crate::error_handler::{AppError, AppResult};

use crate::routes::{
    analyze::analyze_route::analyze_route,
    ask::ask_route::ask_route,
    health_route::health_route,
    sessions::{
        session_routes::{create_session_route, delete_session_route, transcript_route},
        upload_documents_route::upload_documents_route,
    },
};

/// Builds the router with all routes and the JSON error mapper.
pub fn router(state: Arc<AppState>) -> Router {
    let max_upload = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health_route))
        .route("/sessions", post(create_session_route))
        .route("/sessions/{id}", delete(delete_session_route))
        .route(
            "/sessions/{id}/documents",
            post(upload_documents_route).layer(DefaultBodyLimit::max(max_upload)),
        )
        .route("/sessions/{id}/ask", post(ask_route))
        .route("/sessions/{id}/transcript", get(transcript_route))
        .route("/analyze", post(analyze_route))
        .layer(middleware::from_fn(
            middleware_layer::json_extractor::json_error_mapper,
        ))
        .with_state(state)
}

/// Binds `state.config.address` and serves until Ctrl+C.
pub async fn start(state: Arc<AppState>) -> AppResult<()> {
    let address = state.config.address.clone();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(AppError::Bind)?;
    info!(%address, "policy assistant API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
