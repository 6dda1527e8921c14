//! In-memory keyed session store.
//!
//! Sessions are addressed by their local token. Conversations are not
//! persisted across restarts; durable storage is out of scope.

use crate::models::{ConversationSession, RunState, Turn};
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("A run is already in progress for session {0}")]
    Busy(String),
}

/// Keyed store of live conversation sessions.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, ConversationSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: ConversationSession) {
        self.sessions.insert(session.session_id.clone(), session);
    }

    pub fn find(&self, session_id: &str) -> Option<ConversationSession> {
        self.sessions.get(session_id).map(|s| s.value().clone())
    }

    pub fn delete(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Claim the session for a new run.
    ///
    /// Compare-and-set from `Idle` to `AwaitingRun`; a session may have at
    /// most one run outstanding. Returns a snapshot of the claimed session.
    pub fn begin_run(&self, session_id: &str) -> Result<ConversationSession, StoreError> {
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| StoreError::NotFound(session_id.to_string()))?;

        if entry.run_state == RunState::AwaitingRun {
            return Err(StoreError::Busy(session_id.to_string()));
        }

        entry.run_state = RunState::AwaitingRun;
        Ok(entry.value().clone())
    }

    /// Record a finished turn pair and release the run claim.
    pub fn record_turns(&self, session_id: &str, user: Turn, assistant: Turn) {
        if let Some(mut entry) = self.sessions.get_mut(session_id) {
            entry.push_turn(user);
            entry.push_turn(assistant);
            entry.run_state = RunState::Idle;
        }
    }

    /// Release the run claim without recording turns (failed run paths).
    pub fn clear_run(&self, session_id: &str) {
        if let Some(mut entry) = self.sessions.get_mut(session_id) {
            entry.run_state = RunState::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UploadedDocument;

    fn sample_session() -> ConversationSession {
        ConversationSession::new(
            "thread-1".to_string(),
            None,
            UploadedDocument::new(
                "contract.txt".to_string(),
                "text/plain".to_string(),
                12,
                "utf-8".to_string(),
                "sample text".to_string(),
            ),
        )
    }

    #[test]
    fn begin_run_claims_and_rejects_second_claim() {
        let store = SessionStore::new();
        let session = sample_session();
        let id = session.session_id.clone();
        store.insert(session);

        assert!(store.begin_run(&id).is_ok());
        assert!(matches!(store.begin_run(&id), Err(StoreError::Busy(_))));

        store.clear_run(&id);
        assert!(store.begin_run(&id).is_ok());
    }

    #[test]
    fn begin_run_on_unknown_session_is_not_found() {
        let store = SessionStore::new();
        assert!(matches!(
            store.begin_run("missing"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn record_turns_appends_and_releases() {
        let store = SessionStore::new();
        let session = sample_session();
        let id = session.session_id.clone();
        store.insert(session);

        store.begin_run(&id).unwrap();
        store.record_turns(
            &id,
            Turn::user("hello".to_string()),
            Turn::assistant(
                "hi".to_string(),
                crate::services::assistants::RunStatus::Completed,
            ),
        );

        let session = store.find(&id).unwrap();
        assert_eq!(session.turn_count, 2);
        assert_eq!(session.run_state, RunState::Idle);
    }

    #[test]
    fn delete_removes_session() {
        let store = SessionStore::new();
        let session = sample_session();
        let id = session.session_id.clone();
        store.insert(session);

        assert!(store.delete(&id));
        assert!(!store.delete(&id));
        assert!(store.find(&id).is_none());
    }
}
