//! Discord - serenity adapter

pub mod adapter;
pub mod commands;
pub mod config;
pub mod handler;

pub use adapter::{DiscordAdapter, IncomingMessage};
pub use config::{DiscordConfig, DmPolicy};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    const BOT_ID: u64 = 999;

    fn adapter(config: DiscordConfig) -> DiscordAdapter {
        let adapter = DiscordAdapter::new(config);
        adapter.bot_user_id.store(BOT_ID, Ordering::SeqCst);
        adapter
    }

    fn guild_message(content: &str) -> IncomingMessage {
        IncomingMessage {
            channel_id: 10,
            guild_id: Some(123),
            user_id: 42,
            user_name: "alice".to_string(),
            message_id: 7,
            content: content.to_string(),
            ..IncomingMessage::default()
        }
    }

    #[test]
    fn test_discord_config() {
        let config = DiscordConfig::new("test_token")
            .with_allowed_guilds(vec![123, 456])
            .with_require_mention(false);

        assert_eq!(config.bot_token, "test_token");
        assert_eq!(config.allowed_guilds, vec![123, 456]);
        assert!(!config.require_mention);
    }

    #[test]
    fn test_guild_allowed() {
        let adapter = adapter(DiscordConfig::new("token").with_allowed_guilds(vec![123, 456]));

        assert!(adapter.is_guild_allowed(123));
        assert!(adapter.is_guild_allowed(456));
        assert!(!adapter.is_guild_allowed(789));
    }

    #[test]
    fn test_empty_allowlist_allows_all() {
        let adapter = adapter(DiscordConfig::new("token"));
        assert!(adapter.is_guild_allowed(1));
        assert!(adapter.is_channel_allowed(1));
    }

    #[test]
    fn test_mention_required_in_guild() {
        let adapter = adapter(DiscordConfig::new("token"));
        assert!(adapter.normalize(&guild_message("hello")).is_none());

        let mut msg = guild_message("<@999> hello there");
        msg.mentions = vec![BOT_ID];
        let normalized = adapter.normalize(&msg).unwrap();
        assert_eq!(normalized.text, "hello there");
        assert_eq!(normalized.user_id, "42");
        assert_eq!(normalized.user_name, "alice");
        assert_eq!(normalized.channel_id, "10");
    }

    #[test]
    fn test_reply_to_bot_counts_as_mention() {
        let adapter = adapter(DiscordConfig::new("token"));
        let mut msg = guild_message("and then?");
        msg.replied_to_author = Some(BOT_ID);
        let normalized = adapter.normalize(&msg).unwrap();
        assert!(normalized.is_reply);
    }

    #[test]
    fn test_bots_and_empty_skipped() {
        let adapter = adapter(DiscordConfig::new("token").with_require_mention(false));
        let mut msg = guild_message("beep");
        msg.author_is_bot = true;
        assert!(!adapter.is_permitted(&msg));
        assert!(adapter.normalize(&msg).is_none());

        let mut msg = guild_message("<@999>");
        msg.mentions = vec![BOT_ID];
        assert!(adapter.normalize(&msg).is_none());
    }

    #[test]
    fn test_dm_policy() {
        let mut dm = guild_message("hi");
        dm.guild_id = None;

        let open = adapter(DiscordConfig::new("token"));
        assert!(open.normalize(&dm).is_some());

        let closed = adapter(DiscordConfig::new("token").with_dm_policy(DmPolicy::Disabled));
        assert!(closed.normalize(&dm).is_none());
    }

    #[test]
    fn test_channel_allowlist() {
        let adapter = adapter(
            DiscordConfig::new("token")
                .with_allowed_channels(vec![11])
                .with_require_mention(false),
        );
        assert!(!adapter.is_permitted(&guild_message("hi")));
    }

    #[tokio::test]
    async fn test_send_before_connect_fails() {
        use crate::message::{ChannelAdapter, OutgoingMessage};
        let adapter = adapter(DiscordConfig::new("token"));
        let result = adapter.send_message("10", OutgoingMessage::text("hi")).await;
        assert!(matches!(result, Err(crate::Error::NotConnected)));
        let result = adapter.send_message("abc", OutgoingMessage::text("hi")).await;
        assert!(matches!(result, Err(crate::Error::Parse(_))));
    }
}
