use super::config::{DiscordConfig, DmPolicy};
use super::handler::DiscordHandler;
use crate::error::{Error, Result};
use crate::message::{ChannelAdapter, ChannelType, NormalizedMessage, OutgoingMessage};
use crate::util::{split_message, DISCORD_MESSAGE_LIMIT};

use parley_core::ChatEngine;
use serenity::all::{
    ChannelId, Client, CreateMessage, GatewayIntents, Message, MessageId, MessageReference,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Platform-independent view of an inbound Discord message
#[derive(Debug, Clone, Default)]
pub struct IncomingMessage {
    /// Channel the message was posted in
    pub channel_id: u64,
    /// Guild, `None` for DMs
    pub guild_id: Option<u64>,
    /// Author ID
    pub user_id: u64,
    /// Author display name
    pub user_name: String,
    /// Message ID
    pub message_id: u64,
    /// Raw content
    pub content: String,
    /// Whether the author is a bot
    pub author_is_bot: bool,
    /// IDs of mentioned users
    pub mentions: Vec<u64>,
    /// Author of the message this replies to
    pub replied_to_author: Option<u64>,
}

impl IncomingMessage {
    /// Extract the fields the adapter cares about
    #[must_use]
    pub fn from_serenity(msg: &Message) -> Self {
        Self {
            channel_id: msg.channel_id.get(),
            guild_id: msg.guild_id.map(|g| g.get()),
            user_id: msg.author.id.get(),
            user_name: msg
                .author
                .global_name
                .clone()
                .unwrap_or_else(|| msg.author.name.clone()),
            message_id: msg.id.get(),
            content: msg.content.clone(),
            author_is_bot: msg.author.bot,
            mentions: msg.mentions.iter().map(|u| u.id.get()).collect(),
            replied_to_author: msg.referenced_message.as_ref().map(|r| r.author.id.get()),
        }
    }
}

/// Discord bot adapter
pub struct DiscordAdapter {
    pub(crate) config: DiscordConfig,
    pub(crate) bot_user_id: AtomicU64,
    pub(crate) http: RwLock<Option<Arc<serenity::http::Http>>>,
}

impl DiscordAdapter {
    /// Create a new Discord adapter
    #[must_use]
    pub fn new(config: DiscordConfig) -> Self {
        Self {
            config,
            bot_user_id: AtomicU64::new(0),
            http: RwLock::new(None),
        }
    }

    /// Create from environment
    pub fn from_env() -> Result<Self> {
        let config = DiscordConfig::from_env()?;
        Ok(Self::new(config))
    }

    /// Check if a guild is allowed
    pub fn is_guild_allowed(&self, guild_id: u64) -> bool {
        self.config.allowed_guilds.is_empty() || self.config.allowed_guilds.contains(&guild_id)
    }

    /// Check if a channel is allowed
    pub fn is_channel_allowed(&self, channel_id: u64) -> bool {
        self.config.allowed_channels.is_empty()
            || self.config.allowed_channels.contains(&channel_id)
    }

    /// Get the bot user ID
    pub fn bot_user_id(&self) -> u64 {
        self.bot_user_id.load(Ordering::SeqCst)
    }

    /// Run the bot until `cancel` fires or the gateway connection ends
    #[instrument(skip(self, engine, cancel))]
    pub async fn run(self: Arc<Self>, engine: Arc<ChatEngine>, cancel: CancellationToken) -> Result<()> {
        info!("Starting Discord bot");

        let intents = GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT;

        let handler = DiscordHandler::new(self.clone(), engine);

        let mut client = Client::builder(&self.config.bot_token, intents)
            .event_handler(handler)
            .await
            .map_err(|e| Error::Discord(format!("Failed to create client: {}", e)))?;

        {
            let mut http_guard = self.http.write().await;
            *http_guard = Some(client.http.clone());
        }

        let shard_manager = client.shard_manager.clone();
        tokio::spawn(async move {
            cancel.cancelled().await;
            info!("Stopping Discord gateway");
            shard_manager.shutdown_all().await;
        });

        client
            .start()
            .await
            .map_err(|e| Error::Discord(format!("Client error: {}", e)))?;

        Ok(())
    }

    /// Whether the message is addressed to the bot
    ///
    /// DMs always are; in guilds it depends on `require_mention`.
    fn is_addressed(&self, msg: &IncomingMessage) -> bool {
        if msg.guild_id.is_none() || !self.config.require_mention {
            return true;
        }
        let bot_id = self.bot_user_id();
        msg.mentions.contains(&bot_id) || msg.replied_to_author == Some(bot_id)
    }

    /// Whether the message may be observed at all (bots, allow-lists, DM policy)
    pub fn is_permitted(&self, msg: &IncomingMessage) -> bool {
        if msg.author_is_bot {
            return false;
        }
        match msg.guild_id {
            None if self.config.dm_policy == DmPolicy::Disabled => {
                debug!(user_id = %msg.user_id, "DM rejected by dm_policy=disabled");
                return false;
            }
            Some(gid) if !self.is_guild_allowed(gid) => {
                debug!(guild_id = %gid, "Guild not allowed");
                return false;
            }
            _ => {}
        }
        if !self.is_channel_allowed(msg.channel_id) {
            debug!(channel_id = %msg.channel_id, "Channel not allowed");
            return false;
        }
        true
    }

    /// Convert a message addressed to the bot into a normalized message
    ///
    /// Returns `None` for messages the bot should not answer.
    pub fn normalize(&self, msg: &IncomingMessage) -> Option<NormalizedMessage> {
        if !self.is_permitted(msg) || !self.is_addressed(msg) {
            return None;
        }

        let bot_id = self.bot_user_id();
        let clean_text = msg
            .content
            .replace(&format!("<@{}>", bot_id), "")
            .replace(&format!("<@!{}>", bot_id), "")
            .trim()
            .to_string();
        if clean_text.is_empty() {
            return None;
        }

        let mut normalized = NormalizedMessage::new(
            ChannelType::Discord,
            msg.channel_id.to_string(),
            msg.user_id.to_string(),
            msg.message_id.to_string(),
            clean_text,
        )
        .with_user_name(msg.user_name.clone());

        if msg.replied_to_author.is_some() {
            normalized = normalized.as_reply();
        }

        Some(normalized)
    }

    /// Convert a serenity message to a normalized message
    pub fn normalize_message(&self, msg: &Message) -> Option<NormalizedMessage> {
        self.normalize(&IncomingMessage::from_serenity(msg))
    }

    async fn http(&self) -> Result<Arc<serenity::http::Http>> {
        self.http.read().await.clone().ok_or(Error::NotConnected)
    }
}

fn parse_id(value: &str, what: &str) -> Result<u64> {
    value
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .ok_or_else(|| Error::Parse(format!("Invalid {} ID", what)))
}

#[async_trait::async_trait]
impl ChannelAdapter for DiscordAdapter {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Discord
    }

    async fn send_message(&self, channel_id: &str, message: OutgoingMessage) -> Result<Vec<String>> {
        let channel = ChannelId::new(parse_id(channel_id, "channel")?);
        let reply_to = message
            .reply_to
            .as_deref()
            .and_then(|id| id.parse::<u64>().ok())
            .filter(|id| *id != 0);
        let http = self.http().await?;

        let mut sent_ids = Vec::new();
        for (index, chunk) in split_message(&message.text, DISCORD_MESSAGE_LIMIT)
            .into_iter()
            .enumerate()
        {
            let mut builder = CreateMessage::new().content(chunk);
            // Only the first chunk is threaded as a reply
            if let (0, Some(msg_id)) = (index, reply_to) {
                builder = builder
                    .reference_message(MessageReference::from((channel, MessageId::new(msg_id))));
            }

            let sent = channel
                .send_message(&http, builder)
                .await
                .map_err(|e| Error::Discord(format!("Failed to send message: {}", e)))?;
            sent_ids.push(sent.id.get().to_string());
        }

        Ok(sent_ids)
    }

    async fn send_typing(&self, channel_id: &str) -> Result<()> {
        let channel = ChannelId::new(parse_id(channel_id, "channel")?);
        let http = self.http().await?;

        channel
            .broadcast_typing(&http)
            .await
            .map_err(|e| Error::Discord(format!("Failed to send typing: {}", e)))?;

        Ok(())
    }
}
