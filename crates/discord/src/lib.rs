//! Discord adapter: serenity gateway events in, HTTP API replies out.

pub mod gateway;
pub mod markdown;
pub mod outbound;

pub use {gateway::DiscordHandler, outbound::DiscordOutbound};
