//! Remote assistants-API abstraction and implementations.
//!
//! This module provides a trait-based abstraction over the hosted
//! conversational-AI service (threads, messages, polled runs), allowing
//! easy swapping between the real backend and a scripted mock.

pub mod mock;
pub mod openai;

use async_trait::async_trait;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error type for remote assistants-service operations.
#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Assistant service not configured: {0}")]
    NotConfigured(String),

    #[error("Assistant API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Rate limited by assistant service")]
    RateLimited,

    #[error("Invalid response from assistant service: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Status of a remote run as reported by the service.
///
/// `completed`, `failed`, `cancelled` and `expired` are terminal; anything
/// else (including statuses this build does not know about) means the run
/// is still in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    Cancelled,
    Expired,
    Other(String),
}

impl RunStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "queued" => RunStatus::Queued,
            "in_progress" => RunStatus::InProgress,
            "completed" => RunStatus::Completed,
            "failed" => RunStatus::Failed,
            "cancelled" => RunStatus::Cancelled,
            "expired" => RunStatus::Expired,
            other => RunStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Expired => "expired",
            RunStatus::Other(raw) => raw,
        }
    }

    /// Whether this status ends a wait (successfully or not).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RunStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RunStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StatusVisitor;

        impl<'de> de::Visitor<'de> for StatusVisitor {
            type Value = RunStatus;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a run status string")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<RunStatus, E> {
                Ok(RunStatus::parse(value))
            }
        }

        deserializer.deserialize_str(StatusVisitor)
    }
}

/// A remote run: one request to have the assistant process the thread.
#[derive(Debug, Clone)]
pub struct Run {
    /// Run identifier.
    pub id: String,

    /// Last observed status.
    pub status: RunStatus,

    /// Outputs produced by the run; `outputs[0].text` is the reply.
    pub outputs: Vec<RunOutput>,

    /// Error message reported by the service for failed runs.
    pub last_error: Option<String>,
}

/// One output item of a completed run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub text: String,
}

impl Run {
    /// The assistant's reply text, if the run produced one.
    pub fn reply_text(&self) -> Option<&str> {
        self.outputs.first().map(|o| o.text.as_str())
    }
}

/// Structured function-call payload attached to a run.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: serde_json::Value,
}

impl FunctionCall {
    /// The document-analysis call attached to the first run of a session.
    pub fn contract_check(contract_text: &str) -> Self {
        Self {
            name: "contract_check".to_string(),
            arguments: serde_json::json!({ "contract_text": contract_text }),
        }
    }
}

/// Trait for the remote conversational-AI service.
///
/// Mirrors the remote contract: threads accumulate messages, runs process
/// them, and run status is polled until terminal.
#[async_trait]
pub trait ThreadService: Send + Sync {
    /// Create a new remote thread; returns its identifier.
    async fn create_thread(&self) -> Result<String, AssistantError>;

    /// Append a message to a thread; returns the message identifier.
    async fn create_message(
        &self,
        thread_id: &str,
        role: &str,
        content: &str,
    ) -> Result<String, AssistantError>;

    /// Request a run over the thread, optionally attaching a function call.
    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        function_call: Option<FunctionCall>,
    ) -> Result<Run, AssistantError>;

    /// Query the current state of a run.
    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), AssistantError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_known_statuses() {
        for raw in ["queued", "in_progress", "completed", "failed", "cancelled", "expired"] {
            assert_eq!(RunStatus::parse(raw).as_str(), raw);
        }
    }

    #[test]
    fn unknown_status_is_preserved_and_non_terminal() {
        let status = RunStatus::parse("requires_action");
        assert_eq!(status, RunStatus::Other("requires_action".to_string()));
        assert!(!status.is_terminal());
    }

    #[test]
    fn terminal_statuses() {
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(RunStatus::Cancelled.is_terminal());
        assert!(RunStatus::Expired.is_terminal());
        assert!(!RunStatus::Queued.is_terminal());
        assert!(!RunStatus::InProgress.is_terminal());
    }
}
