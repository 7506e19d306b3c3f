use super::adapter::{DiscordAdapter, IncomingMessage};
use super::commands::{command_from_slash, slash_commands, GAME_OPTION};
use crate::command::{execute_command, ChatCommand};
use crate::message::{ChannelAdapter, OutgoingMessage};
use crate::util::mask_for_logging;
use parley_core::ChatEngine;
use serenity::all::{
    Command, CommandInteraction, Context, CreateInteractionResponse,
    CreateInteractionResponseMessage, EventHandler, Interaction, Message, Ready,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Discord event handler
pub struct DiscordHandler {
    adapter: Arc<DiscordAdapter>,
    engine: Arc<ChatEngine>,
}

impl DiscordHandler {
    /// Create a new Discord event handler.
    pub fn new(adapter: Arc<DiscordAdapter>, engine: Arc<ChatEngine>) -> Self {
        Self { adapter, engine }
    }

    async fn reply_to_text(&self, user_id: &str, user_name: &str, channel_id: &str, text: &str) -> String {
        if let Some(parsed) = ChatCommand::parse(text) {
            return match parsed {
                Ok(command) => execute_command(&self.engine, user_id, command),
                Err(message) => message,
            };
        }

        if let Err(e) = self.adapter.send_typing(channel_id).await {
            debug!(error = %e, "Typing indicator failed");
        }

        let reply = self.engine.respond(user_id, channel_id, text).await;
        self.engine.observe(channel_id, user_name, text).await;
        self.engine
            .observe(channel_id, &self.engine.persona().name, &reply)
            .await;
        reply
    }
}

#[serenity::async_trait]
impl EventHandler for DiscordHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Discord bot connected as {}", ready.user.name);

        self.adapter
            .bot_user_id
            .store(ready.user.id.get(), Ordering::SeqCst);

        match Command::set_global_commands(&ctx.http, slash_commands()).await {
            Ok(cmds) => info!("Registered {} Discord slash commands", cmds.len()),
            Err(e) => error!(error = %e, "Failed to register Discord slash commands"),
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };

        let user_id = command.user.id.get().to_string();
        let game = get_string_option(&command, GAME_OPTION);
        let content = match command_from_slash(command.data.name.as_str(), game.as_deref()) {
            Ok(parsed) => execute_command(&self.engine, &user_id, parsed),
            Err(message) => message,
        };

        let builder =
            CreateInteractionResponse::Message(CreateInteractionResponseMessage::new().content(content));
        if let Err(e) = command.create_response(&ctx.http, builder).await {
            error!(error = %e, "Failed to respond to slash command");
        }
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        let incoming = IncomingMessage::from_serenity(&msg);
        if !self.adapter.is_permitted(&incoming) {
            return;
        }
        let channel_id = incoming.channel_id.to_string();

        let Some(normalized) = self.adapter.normalize(&incoming) else {
            // Not for us, but still part of the channel's conversation
            self.engine
                .observe(&channel_id, &incoming.user_name, &incoming.content)
                .await;
            return;
        };

        info!(
            channel_id = %normalized.channel_id,
            user_id = %normalized.user_id,
            text = %mask_for_logging(&normalized.text),
            "Received Discord message"
        );

        let reply = self
            .reply_to_text(
                &normalized.user_id,
                &normalized.user_name,
                &channel_id,
                &normalized.text,
            )
            .await;

        let outgoing = OutgoingMessage::text(reply).reply_to(normalized.message_id.clone());
        if let Err(e) = self.adapter.send_message(&channel_id, outgoing).await {
            warn!(error = %e, "Failed to send Discord response");
        }
    }
}

/// Extract a string option from a slash command interaction
fn get_string_option(command: &CommandInteraction, name: &str) -> Option<String> {
    command
        .data
        .options
        .iter()
        .find(|o| o.name == name)
        .and_then(|o| o.value.as_str().map(|s| s.to_string()))
}
