use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MantleConfig {
    pub discord: DiscordConfig,
    pub assistant: AssistantConfig,
    pub session: SessionConfig,
}

/// Discord connection and delivery settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token from the Discord developer portal.
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub token: Option<Secret<String>>,

    /// Maximum outbound message length in bytes. Replies longer than this
    /// are split into whitespace-aligned chunks.
    pub message_limit: usize,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: None,
            message_limit: 2000,
        }
    }
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("message_limit", &self.message_limit)
            .finish_non_exhaustive()
    }
}

/// Assistant backend settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// API key for the assistant backend.
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<Secret<String>>,

    /// Identifier of the assistant that generates replies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,

    /// Base URL of the assistants API.
    pub base_url: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            assistant_id: None,
            base_url: "https://api.openai.com/v1".into(),
        }
    }
}

impl std::fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("assistant_id", &self.assistant_id)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Session lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Hours of inactivity after which a conversation session is evicted.
    pub idle_hours: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { idle_hours: 1 }
    }
}

/// Startup view of the config with every required value present.
#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub discord_token: Secret<String>,
    pub api_key: Secret<String>,
    pub assistant_id: String,
    pub base_url: String,
    pub message_limit: usize,
    pub idle_hours: u64,
}

impl MantleConfig {
    /// Resolve the config into the values startup needs.
    ///
    /// Collects all missing required values into a single error so a
    /// misconfigured deployment reports everything at once.
    pub fn resolve(&self) -> crate::error::Result<ResolvedConfig> {
        let mut missing = Vec::new();
        if self.discord.token.is_none() {
            missing.push("DISCORD_TOKEN (discord.token)".to_string());
        }
        if self.assistant.api_key.is_none() {
            missing.push("OPENAI_API_KEY (assistant.api_key)".to_string());
        }
        if self.assistant.assistant_id.is_none() {
            missing.push("ASSISTANT_ID (assistant.assistant_id)".to_string());
        }

        match (
            &self.discord.token,
            &self.assistant.api_key,
            &self.assistant.assistant_id,
        ) {
            (Some(token), Some(api_key), Some(assistant_id)) => Ok(ResolvedConfig {
                discord_token: token.clone(),
                api_key: api_key.clone(),
                assistant_id: assistant_id.clone(),
                base_url: self.assistant.base_url.clone(),
                message_limit: self.discord.message_limit,
                idle_hours: self.session.idle_hours,
            }),
            _ => Err(crate::error::Error::missing(missing)),
        }
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}
