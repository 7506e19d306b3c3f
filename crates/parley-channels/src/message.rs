//! Message - Normalized message types
//!
//! Transports convert platform messages into [`NormalizedMessage`] before
//! handing them to the engine, and send replies through [`ChannelAdapter`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Channel type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    /// Discord
    Discord,
}

impl ChannelType {
    /// Get the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discord => "discord",
        }
    }
}

impl std::fmt::Display for ChannelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A normalized incoming message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedMessage {
    /// Channel type
    pub channel_type: ChannelType,
    /// Channel identifier
    pub channel_id: String,
    /// Sender identifier, used as the session key
    pub user_id: String,
    /// Sender display name
    pub user_name: String,
    /// Platform message ID
    pub message_id: String,
    /// Message text with bot mentions stripped
    pub text: String,
    /// When the message was received
    pub timestamp: DateTime<Utc>,
    /// Whether this replies to one of the bot's messages
    pub is_reply: bool,
}

impl NormalizedMessage {
    /// Create a new normalized message
    #[must_use]
    pub fn new(
        channel_type: ChannelType,
        channel_id: impl Into<String>,
        user_id: impl Into<String>,
        message_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let user_id = user_id.into();
        Self {
            channel_type,
            channel_id: channel_id.into(),
            user_name: user_id.clone(),
            user_id,
            message_id: message_id.into(),
            text: text.into(),
            timestamp: Utc::now(),
            is_reply: false,
        }
    }

    /// Set the user name
    #[must_use]
    pub fn with_user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = name.into();
        self
    }

    /// Mark as a reply
    #[must_use]
    pub fn as_reply(mut self) -> Self {
        self.is_reply = true;
        self
    }
}

/// A normalized outgoing message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Text content
    pub text: String,
    /// Platform message ID to reply to
    pub reply_to: Option<String>,
}

impl OutgoingMessage {
    /// Create a plain text message
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            text: content.into(),
            reply_to: None,
        }
    }

    /// Reply to a message
    #[must_use]
    pub fn reply_to(mut self, message_id: impl Into<String>) -> Self {
        self.reply_to = Some(message_id.into());
        self
    }
}

/// Trait for channel adapters
#[async_trait::async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Get the channel type
    fn channel_type(&self) -> ChannelType;

    /// Send a message, split to the platform limit; returns the sent IDs
    async fn send_message(
        &self,
        channel_id: &str,
        message: OutgoingMessage,
    ) -> crate::Result<Vec<String>>;

    /// Send a typing indicator
    async fn send_typing(&self, channel_id: &str) -> crate::Result<()>;
}
