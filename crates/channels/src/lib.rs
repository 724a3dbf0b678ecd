//! Chat-platform seam.
//!
//! The router consumes inbound messages and delivers replies through the
//! traits defined here; the platform adapter (Discord) provides the concrete
//! implementations. Also home to the outbound chunker and the
//! broadcast-mention safety gate.

pub mod chunk;
pub mod error;
pub mod gating;
pub mod plugin;

pub use {
    error::{Error, Result},
    plugin::{ChannelOutbound, InboundMessage, TypingGuard},
};
