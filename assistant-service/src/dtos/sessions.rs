use crate::models::{ConversationSession, RunState, Turn, UploadedDocument};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Follow-up turn request.
#[derive(Debug, Deserialize, Validate)]
pub struct PostMessageRequest {
    #[validate(length(min = 1, max = 32768))]
    pub message: String,
}

/// Document metadata returned to callers (decoded text stays server-side;
/// it is part of the first turn's content).
#[derive(Debug, Serialize)]
pub struct DocumentView {
    pub filename: String,
    pub mime_type: String,
    pub size: i64,
    pub encoding: String,
}

impl From<&UploadedDocument> for DocumentView {
    fn from(doc: &UploadedDocument) -> Self {
        Self {
            filename: doc.filename.clone(),
            mime_type: doc.mime_type.clone(),
            size: doc.size,
            encoding: doc.encoding.clone(),
        }
    }
}

/// Response for session creation: the new session plus the assistant's
/// first reply.
#[derive(Debug, Serialize)]
pub struct SessionCreatedResponse {
    pub session_id: String,
    pub thread_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub document: DocumentView,
    pub reply: String,
    pub turn_count: i32,
}

/// Response for a follow-up turn.
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub session_id: String,
    pub reply: String,
    pub turn_count: i32,
}

/// Full session view with turns.
#[derive(Debug, Serialize)]
pub struct SessionDetailResponse {
    pub session_id: String,
    pub thread_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub document: DocumentView,
    pub turns: Vec<Turn>,
    pub turn_count: i32,
    pub run_state: RunState,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl From<ConversationSession> for SessionDetailResponse {
    fn from(session: ConversationSession) -> Self {
        Self {
            session_id: session.session_id,
            thread_id: session.thread_id,
            title: session.title,
            document: DocumentView::from(&session.document),
            turns: session.turns,
            turn_count: session.turn_count,
            run_state: session.run_state,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}
