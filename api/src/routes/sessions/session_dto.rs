use policy_analyst::ChatMessage;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct UploadedDocument {
    pub name: String,
    pub bytes: usize,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub documents: Vec<UploadedDocument>,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub session_id: Uuid,
    pub messages: Vec<ChatMessage>,
}
