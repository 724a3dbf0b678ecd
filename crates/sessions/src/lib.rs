//! In-memory conversation-session store.
//!
//! Each conversation-bearing channel maps to one session holding its backend
//! thread handle and last-activity timestamp. Sessions are created cold on
//! first contact, gain a thread on first real use, and are evicted after a
//! configured idle period. Nothing survives a restart.

pub mod error;
pub mod registry;

pub use {
    error::{Error, Result},
    registry::{Session, SessionGuard, SessionRegistry},
};
