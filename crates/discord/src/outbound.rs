use std::sync::{Arc, RwLock};

use {
    async_trait::async_trait,
    serenity::{
        all::ChannelId,
        http::{Http, Typing},
    },
    tracing::debug,
};

use mantle_channels::{ChannelOutbound, Error, Result, TypingGuard};

/// Sends replies through the Discord HTTP API.
///
/// The HTTP client only exists once the gateway has connected; until then
/// every operation reports unavailable.
pub struct DiscordOutbound {
    http: RwLock<Option<Arc<Http>>>,
}

impl DiscordOutbound {
    pub fn new() -> Self {
        Self {
            http: RwLock::new(None),
        }
    }

    /// Install the HTTP client once the gateway's ready event delivers it.
    pub(crate) fn connect(&self, http: Arc<Http>) {
        *self.http.write().unwrap() = Some(http);
    }

    fn http(&self) -> Result<Arc<Http>> {
        self.http
            .read()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::unavailable("discord gateway not connected"))
    }
}

impl Default for DiscordOutbound {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_channel(to: &str) -> Result<ChannelId> {
    to.parse::<u64>()
        .map(ChannelId::new)
        .map_err(|e| Error::external("invalid channel id", e))
}

/// Keeps the typing indicator alive until dropped.
struct DiscordTyping {
    typing: Option<Typing>,
}

impl TypingGuard for DiscordTyping {}

impl Drop for DiscordTyping {
    fn drop(&mut self) {
        if let Some(typing) = self.typing.take() {
            typing.stop();
        }
    }
}

#[async_trait]
impl ChannelOutbound for DiscordOutbound {
    async fn send_text(&self, to: &str, text: &str) -> Result<()> {
        let http = self.http()?;
        let channel = parse_channel(to)?;
        channel
            .say(&http, text)
            .await
            .map_err(|e| Error::external("send message", e))?;
        debug!(channel_id = to, bytes = text.len(), "sent message");
        Ok(())
    }

    async fn start_typing(&self, to: &str) -> Result<Box<dyn TypingGuard>> {
        let http = self.http()?;
        let channel = parse_channel(to)?;
        Ok(Box::new(DiscordTyping {
            typing: Some(channel.start_typing(&http)),
        }))
    }
}
