//! Configuration loading and validation.
//!
//! Values come from the environment first (`DISCORD_TOKEN`, `OPENAI_API_KEY`,
//! `ASSISTANT_ID`, ...) with fallback to a `mantle.toml` config file searched
//! in `./` then `~/.config/mantle/`.

pub mod error;
pub mod loader;
pub mod schema;

pub use {
    error::{Error, Result},
    loader::{apply_env_overrides, discover_and_load, load_config},
    schema::{AssistantConfig, DiscordConfig, MantleConfig, ResolvedConfig, SessionConfig},
};
