//! Session model for conversation state.

use crate::models::UploadedDocument;
use crate::services::assistants::RunStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A conversation about one uploaded document, mapped to a remote thread.
///
/// Sessions are addressed by `session_id` in the keyed store; `thread_id`
/// is the remote service's handle for the same conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    /// Local session token.
    pub session_id: String,

    /// Remote thread identifier.
    pub thread_id: String,

    /// Optional human-readable title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// The document this conversation is about.
    pub document: UploadedDocument,

    /// Ordered turns exchanged so far.
    pub turns: Vec<Turn>,

    /// Total number of turns.
    pub turn_count: i32,

    /// Whether a run is currently outstanding for this session.
    pub run_state: RunState,

    /// When the session was created.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    /// When the session was last updated.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

/// Run bookkeeping state for a session.
///
/// Exactly one run may be outstanding at a time; the store flips this flag
/// with a compare-and-set before a turn starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    AwaitingRun,
}

/// One message exchange unit, attributed to the user or the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced this turn.
    pub role: TurnRole,

    /// Turn content.
    pub content: String,

    /// Completion status of the run that produced this turn
    /// (assistant turns only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RunStatus>,

    /// When the turn was recorded.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

impl ConversationSession {
    /// Create a new session around a freshly created remote thread.
    pub fn new(thread_id: String, title: Option<String>, document: UploadedDocument) -> Self {
        let now = Utc::now();
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            thread_id,
            title,
            document,
            turns: Vec::new(),
            turn_count: 0,
            run_state: RunState::Idle,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a turn and update bookkeeping.
    pub fn push_turn(&mut self, turn: Turn) {
        self.turns.push(turn);
        self.turn_count = self.turns.len() as i32;
        self.updated_at = Utc::now();
    }
}

impl Turn {
    pub fn user(content: String) -> Self {
        Self {
            role: TurnRole::User,
            content,
            status: None,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: String, status: RunStatus) -> Self {
        Self {
            role: TurnRole::Assistant,
            content,
            status: Some(status),
            timestamp: Utc::now(),
        }
    }
}
