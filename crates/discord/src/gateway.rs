//! Serenity gateway wiring and event translation.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use {
    serenity::{
        all::{Client, Context, EventHandler, GatewayIntents, Message, Ready},
        async_trait,
    },
    tokio_util::sync::CancellationToken,
    tracing::info,
};

use {mantle_channels::InboundMessage, mantle_chat::ChatEngine};

use crate::{markdown, outbound::DiscordOutbound};

/// Handler for Discord gateway events.
pub struct DiscordHandler {
    engine: Arc<ChatEngine>,
    outbound: Arc<DiscordOutbound>,
    bot_user_id: AtomicU64,
}

impl DiscordHandler {
    /// Required gateway intents for the bot.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
    }

    fn bot_user_id(&self) -> Option<u64> {
        match self.bot_user_id.load(Ordering::SeqCst) {
            0 => None,
            id => Some(id),
        }
    }
}

#[async_trait]
impl EventHandler for DiscordHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            bot_name = %ready.user.name,
            guilds = ready.guilds.len(),
            "discord bot ready"
        );
        self.bot_user_id.store(ready.user.id.get(), Ordering::SeqCst);
        self.outbound.connect(ctx.http.clone());
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        let bot_user_id = self.bot_user_id();
        let mentions_bot = bot_user_id.is_some_and(|id| msg.mentions_user_id(id));

        let inbound = InboundMessage {
            channel_id: msg.channel_id.to_string(),
            author_id: msg.author.id.to_string(),
            author_name: msg
                .author
                .global_name
                .clone()
                .or_else(|| Some(msg.author.name.clone())),
            author_is_bot: msg.author.bot,
            clean_content: markdown::clean_content(&msg.content, bot_user_id),
            content: msg.content,
            mentions_bot,
        };

        self.engine.handle(&inbound).await;
    }
}

/// Connect to the gateway and process events until `cancel` fires.
pub async fn run(
    token: String,
    engine: Arc<ChatEngine>,
    outbound: Arc<DiscordOutbound>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let handler = DiscordHandler {
        engine,
        outbound,
        bot_user_id: AtomicU64::new(0),
    };

    let mut client = Client::builder(&token, DiscordHandler::intents())
        .event_handler(handler)
        .await?;
    let shard_manager = client.shard_manager.clone();

    tokio::select! {
        result = client.start() => {
            result?;
            info!("discord gateway disconnected");
        },
        () = cancel.cancelled() => {
            info!("shutting down discord gateway");
            shard_manager.shutdown_all().await;
        },
    }

    Ok(())
}
