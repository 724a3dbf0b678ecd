//! Picks the reply produced by a just-completed run.

use crate::api::{Role, ThreadMessage};

/// Fixed reply used when a completed run left no assistant message behind.
pub const NO_REPLY: &str = "No response from the assistant.";

/// Select the reply for a run created at `since` (backend clock).
///
/// Considers assistant-authored messages created at or after the run, and
/// returns the one with the newest timestamp. The timestamp scope keeps a
/// late-landing message from an earlier run out of the running. On equal
/// timestamps the last message in backend-returned order wins.
pub fn latest_reply(messages: &[ThreadMessage], since: i64) -> Option<&str> {
    messages
        .iter()
        .filter(|message| message.role == Role::Assistant && message.created_at >= since)
        .max_by_key(|message| message.created_at)
        .map(|message| message.content.as_str())
}
