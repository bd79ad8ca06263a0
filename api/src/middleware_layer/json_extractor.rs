//! Wraps plain-text extractor rejections (bad path ids, missing content type,
//! oversized bodies) into the JSON envelope and tags every response with a
//! request id.

use axum::{
    body::{Body, Bytes},
    http::{HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::core::http::response_envelope::{ApiErrorDetail, ApiResponse};

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Upper bound for buffering a rejection body.
const MAX_REJECTION_BODY: usize = 64 * 1024;

async fn take_body(res: Response) -> (axum::http::response::Parts, Bytes) {
    let (parts, body) = res.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_REJECTION_BODY)
        .await
        .unwrap_or_default();
    (parts, bytes)
}

fn request_id(req: &Request<Body>) -> String {
    if let Some(v) = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.trim().is_empty())
    {
        return v.to_string();
    }
    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros() * 1000);
    format!("req-{nanos}")
}

fn code_for(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "BAD_REQUEST",
        StatusCode::NOT_FOUND => "NOT_FOUND",
        StatusCode::METHOD_NOT_ALLOWED => "METHOD_NOT_ALLOWED",
        StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
        StatusCode::UNPROCESSABLE_ENTITY => "UNPROCESSABLE_ENTITY",
        _ => "CLIENT_ERROR",
    }
}

fn is_json(parts: &axum::http::response::Parts) -> bool {
    parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

pub async fn json_error_mapper(req: Request<Body>, next: Next) -> Response {
    let id = request_id(&req);
    let id_header = HeaderValue::from_str(&id).ok();

    let res = next.run(req).await;
    let status = res.status();

    let mut res = if status.is_client_error() {
        let (mut parts, bytes) = take_body(res).await;
        if is_json(&parts) {
            Response::from_parts(parts, bytes.into())
        } else {
            let original = String::from_utf8_lossy(&bytes);
            let detail = ApiErrorDetail {
                path: None,
                hint: if status == StatusCode::UNSUPPORTED_MEDIA_TYPE {
                    Some("Send JSON with `content-type: application/json`.".into())
                } else if original.contains("UUID") || original.contains("uuid") {
                    Some("Session ids are UUIDs returned by POST /sessions.".into())
                } else {
                    None
                },
            };
            let message = if original.trim().is_empty() {
                status.canonical_reason().unwrap_or("client error").to_string()
            } else {
                original.trim().to_string()
            };
            let envelope = ApiResponse::<()>::error(code_for(status), message, vec![detail]);
            let body = serde_json::to_vec(&envelope).unwrap_or_else(|_| bytes.to_vec());

            parts.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, body.into())
        }
    } else {
        res
    };

    if let Some(value) = id_header {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}
