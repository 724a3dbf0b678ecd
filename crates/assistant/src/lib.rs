//! Assistant-backend seam: the thread/run protocol the relay speaks.
//!
//! The router drives a conversation by creating a thread once per session,
//! posting user messages to it, starting a run, polling the run to
//! completion, and reading the newest assistant message back. Everything
//! network-shaped hides behind [`AssistantBackend`]; [`http::HttpBackend`]
//! is the production implementation.

pub mod api;
pub mod error;
pub mod http;
pub mod poll;
pub mod select;

pub use {
    api::{AssistantBackend, Role, Run, RunId, RunStatus, ThreadId, ThreadMessage},
    error::{Error, Result},
};
