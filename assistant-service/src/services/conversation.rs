//! Conversation session manager.
//!
//! Drives one remote conversation per session: quota gate, thread
//! creation, per-turn message + run, and a bounded poll for completion.

use crate::models::{ConversationSession, Turn, TurnRole, UploadedDocument};
use crate::services::assistants::{
    AssistantError, FunctionCall, Run, RunStatus, ThreadService,
};
use crate::services::quota::QuotaGate;
use crate::services::store::{SessionStore, StoreError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

#[derive(Error, Debug)]
pub enum ConversationError {
    #[error("Usage limit reached")]
    QuotaExceeded,

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("A run is already in progress for session {0}")]
    RunInFlight(String),

    #[error("Run {run_id} failed: {message}")]
    RunFailed { run_id: String, message: String },

    #[error("Run {0} was cancelled")]
    RunCancelled(String),

    #[error("Run {0} expired")]
    RunExpired(String),

    #[error("Run {run_id} did not finish within {waited_secs}s")]
    RunTimeout { run_id: String, waited_secs: u64 },

    #[error(transparent)]
    Assistant(#[from] AssistantError),
}

impl From<StoreError> for ConversationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ConversationError::SessionNotFound(id),
            StoreError::Busy(id) => ConversationError::RunInFlight(id),
        }
    }
}

/// Owns the session lifecycle and the per-turn request/response cycle.
pub struct ConversationManager {
    service: Arc<dyn ThreadService>,
    store: SessionStore,
    quota: Arc<dyn QuotaGate>,
    assistant_id: String,
    poll_interval: Duration,
    run_timeout: Duration,
}

impl ConversationManager {
    pub fn new(
        service: Arc<dyn ThreadService>,
        store: SessionStore,
        quota: Arc<dyn QuotaGate>,
        assistant_id: String,
        poll_interval: Duration,
        run_timeout: Duration,
    ) -> Self {
        Self {
            service,
            store,
            quota,
            assistant_id,
            poll_interval,
            run_timeout,
        }
    }

    /// Start a new session for the given caller and document.
    ///
    /// The quota gate is consulted first; a zero budget denies the request
    /// before any remote call. Transport errors from thread creation
    /// propagate without retry.
    #[tracing::instrument(skip(self, document), fields(identity = %identity))]
    pub async fn start_session(
        &self,
        identity: &str,
        document: UploadedDocument,
        title: Option<String>,
    ) -> Result<ConversationSession, ConversationError> {
        if self.quota.remaining_quota(identity) == 0 {
            tracing::info!(identity = %identity, "Session denied by usage gate");
            return Err(ConversationError::QuotaExceeded);
        }

        let thread_id = self.service.create_thread().await?;
        let session = ConversationSession::new(thread_id, title, document);

        tracing::info!(
            session_id = %session.session_id,
            thread_id = %session.thread_id,
            filename = %session.document.filename,
            encoding = %session.document.encoding,
            "Session created"
        );

        self.store.insert(session.clone());
        self.quota.record_session(identity);

        Ok(session)
    }

    /// Drive one turn: post the user message, run the assistant, await
    /// completion, record both turns, and return the assistant's reply.
    ///
    /// Strict per-session ordering is enforced by the store's run claim; a
    /// concurrent turn on the same session is rejected rather than queued.
    #[tracing::instrument(skip(self, text), fields(session_id = %session_id, text_len = text.len()))]
    pub async fn converse(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<String, ConversationError> {
        let session = self.store.begin_run(session_id)?;

        match self.post_and_run(&session, text).await {
            Ok(reply) => {
                self.store.record_turns(
                    session_id,
                    Turn::user(text.to_string()),
                    Turn::assistant(reply.clone(), RunStatus::Completed),
                );
                Ok(reply)
            }
            Err(err) => {
                // Release the claim so a failed run cannot wedge the session.
                self.store.clear_run(session_id);
                Err(err)
            }
        }
    }

    /// Append the user turn remotely, trigger a run, and await its reply.
    async fn post_and_run(
        &self,
        session: &ConversationSession,
        text: &str,
    ) -> Result<String, ConversationError> {
        self.service
            .create_message(&session.thread_id, TurnRole::User.as_str(), text)
            .await?;

        // The document-analysis function call rides on the first run only.
        let function_call = (session.turn_count == 0)
            .then(|| FunctionCall::contract_check(&session.document.text));

        let run = self
            .service
            .create_run(&session.thread_id, &self.assistant_id, function_call)
            .await?;

        tracing::info!(
            session_id = %session.session_id,
            run_id = %run.id,
            "Run created, awaiting completion"
        );

        let completed = self.await_completion(&session.thread_id, &run.id).await?;

        completed
            .reply_text()
            .map(str::to_owned)
            .ok_or_else(|| {
                AssistantError::InvalidResponse(format!(
                    "run {} completed without output text",
                    completed.id
                ))
                .into()
            })
    }

    /// Wait for a run to reach a terminal status.
    ///
    /// Polls at a fixed interval. `completed` returns the run; `failed`,
    /// `cancelled` and `expired` are distinct outcomes; any other status
    /// keeps polling until the configured deadline, after which the wait
    /// ends with a timeout outcome.
    pub async fn await_completion(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> Result<Run, ConversationError> {
        let started = Instant::now();

        loop {
            let run = self.service.get_run(thread_id, run_id).await?;

            match run.status {
                RunStatus::Completed => return Ok(run),
                RunStatus::Failed => {
                    return Err(ConversationError::RunFailed {
                        run_id: run.id,
                        message: run
                            .last_error
                            .unwrap_or_else(|| "no error reported".to_string()),
                    });
                }
                RunStatus::Cancelled => return Err(ConversationError::RunCancelled(run.id)),
                RunStatus::Expired => return Err(ConversationError::RunExpired(run.id)),
                ref status => {
                    let waited = started.elapsed();
                    if waited >= self.run_timeout {
                        tracing::warn!(
                            run_id = %run.id,
                            status = %status,
                            waited_secs = waited.as_secs(),
                            "Run did not finish before the deadline"
                        );
                        return Err(ConversationError::RunTimeout {
                            run_id: run.id,
                            waited_secs: waited.as_secs(),
                        });
                    }
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }
}
