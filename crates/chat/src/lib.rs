//! Message router: inbound event → session → backend run → chunked reply.
//!
//! [`ChatEngine::handle`] is the single entry point. It filters events that
//! must never trigger a reply, keeps session bookkeeping current, and runs
//! the reply pipeline for messages that mention the bot. Failures never
//! escape to the chat surface raw; the user sees at most one fixed fallback
//! sentence per interaction.

pub mod engine;
pub mod error;

pub use {
    engine::{ChatEngine, FALLBACK_REPLY},
    error::{Error, Result},
};
