use async_trait::async_trait;

use crate::error::Result;

/// An inbound chat-platform message, normalized for the router.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Conversation identifier (channel or DM id).
    pub channel_id: String,
    pub author_id: String,
    pub author_name: Option<String>,
    /// Whether the author is a bot account (including this relay itself).
    pub author_is_bot: bool,
    /// Raw message text as delivered by the platform.
    pub content: String,
    /// Message text with mention tokens and markup stripped.
    pub clean_content: String,
    /// Whether the relay's own user was mentioned.
    pub mentions_bot: bool,
}

/// Deliver text to the chat platform.
#[async_trait]
pub trait ChannelOutbound: Send + Sync {
    async fn send_text(&self, to: &str, text: &str) -> Result<()>;

    /// Begin a typing indicator for a channel.
    ///
    /// The indicator stays active until the returned guard is dropped, so it
    /// is released on success and failure alike.
    async fn start_typing(&self, to: &str) -> Result<Box<dyn TypingGuard>>;
}

/// Scoped typing-indicator handle. Dropping it stops the indicator.
pub trait TypingGuard: Send {}
