//! Domain models for the assistant service.

pub mod document;
pub mod session;

pub use document::UploadedDocument;
pub use session::{ConversationSession, RunState, Turn, TurnRole};
