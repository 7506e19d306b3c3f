use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Whether the bot answers direct messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DmPolicy {
    /// Answer DMs
    #[default]
    Open,
    /// Ignore DMs
    Disabled,
}

impl DmPolicy {
    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("disabled") {
            Self::Disabled
        } else {
            Self::Open
        }
    }
}

/// Discord bot configuration
#[derive(Clone, Deserialize)]
pub struct DiscordConfig {
    /// Bot token (from DISCORD_BOT_TOKEN env)
    pub bot_token: String,
    /// Allowed guild (server) IDs (empty = allow all)
    #[serde(default)]
    pub allowed_guilds: Vec<u64>,
    /// Allowed channel IDs (empty = allow all)
    #[serde(default)]
    pub allowed_channels: Vec<u64>,
    /// Whether to require @mention in guild channels
    #[serde(default = "default_true")]
    pub require_mention: bool,
    /// DM policy
    #[serde(default)]
    pub dm_policy: DmPolicy,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("bot_token", &"[REDACTED]")
            .field("allowed_guilds", &self.allowed_guilds)
            .field("allowed_channels", &self.allowed_channels)
            .field("require_mention", &self.require_mention)
            .field("dm_policy", &self.dm_policy)
            .finish()
    }
}

fn default_true() -> bool {
    true
}

fn parse_id_list(value: Option<String>) -> Vec<u64> {
    value
        .map(|s| {
            s.split(',')
                .filter_map(|id| id.trim().parse().ok())
                .collect()
        })
        .unwrap_or_default()
}

impl DiscordConfig {
    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let bot_token = std::env::var("DISCORD_BOT_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::Config("DISCORD_BOT_TOKEN not set".to_string()))?;

        let require_mention = std::env::var("DISCORD_REQUIRE_MENTION")
            .map(|s| s != "false" && s != "0")
            .unwrap_or(true);

        let dm_policy = std::env::var("DISCORD_DM_POLICY")
            .map(|s| DmPolicy::parse(&s))
            .unwrap_or_default();

        Ok(Self {
            bot_token,
            allowed_guilds: parse_id_list(std::env::var("DISCORD_ALLOWED_GUILDS").ok()),
            allowed_channels: parse_id_list(std::env::var("DISCORD_ALLOWED_CHANNELS").ok()),
            require_mention,
            dm_policy,
        })
    }

    /// Create with a bot token
    #[must_use]
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            allowed_guilds: Vec::new(),
            allowed_channels: Vec::new(),
            require_mention: true,
            dm_policy: DmPolicy::Open,
        }
    }

    /// Set allowed guilds
    #[must_use]
    pub fn with_allowed_guilds(mut self, guilds: Vec<u64>) -> Self {
        self.allowed_guilds = guilds;
        self
    }

    /// Set allowed channels
    #[must_use]
    pub fn with_allowed_channels(mut self, channels: Vec<u64>) -> Self {
        self.allowed_channels = channels;
        self
    }

    /// Set require mention mode
    #[must_use]
    pub fn with_require_mention(mut self, enabled: bool) -> Self {
        self.require_mention = enabled;
        self
    }

    /// Set the DM policy
    #[must_use]
    pub fn with_dm_policy(mut self, policy: DmPolicy) -> Self {
        self.dm_policy = policy;
        self
    }
}
