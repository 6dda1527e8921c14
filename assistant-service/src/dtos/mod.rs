//! Request and response types for the HTTP surface.

pub mod sessions;

pub use sessions::{
    DocumentView, PostMessageRequest, SessionCreatedResponse, SessionDetailResponse, TurnResponse,
};
