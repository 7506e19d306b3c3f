//! Text commands shared by every transport

use parley_core::{ChatEngine, GameKind};
use tracing::info;

/// A user command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    /// Forget the user's conversation
    Reset,
    /// Start a game
    Game(GameKind),
    /// Stop the active game
    EndGame,
    /// List commands
    Help,
}

impl ChatCommand {
    /// Parse `/name [args]`
    ///
    /// Returns `None` when the text is not a command, `Some(Err(_))` with a
    /// user-facing message when it is a command that cannot be understood.
    pub fn parse(text: &str) -> Option<Result<Self, String>> {
        let rest = text.trim().strip_prefix('/')?;
        let mut parts = rest.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default().to_lowercase();
        let args = parts.next().map(str::trim).unwrap_or_default();

        let command = match name.as_str() {
            "reset" | "clear" => Ok(Self::Reset),
            "endgame" => Ok(Self::EndGame),
            "help" => Ok(Self::Help),
            "game" if args.is_empty() => Err(format!("Usage: /game <type>\n{}", game_list())),
            "game" => args.parse::<GameKind>().map(Self::Game),
            other => Err(format!("Unknown command: /{}. Try /help.", other)),
        };
        Some(command)
    }
}

fn game_list() -> String {
    let names: Vec<&str> = GameKind::ALL.iter().map(GameKind::as_str).collect();
    format!("Available games: {}", names.join(", "))
}

/// Run a command against the engine and return the reply text
pub fn execute_command(engine: &ChatEngine, user_id: &str, command: ChatCommand) -> String {
    info!(user_id = %user_id, command = ?command, "Executing command");
    match command {
        ChatCommand::Reset => {
            engine.clear_user(user_id);
            "🧹 Fresh start! I've forgotten our conversation.".to_string()
        }
        ChatCommand::Game(kind) => engine.start_game(user_id, kind),
        ChatCommand::EndGame => match engine.end_game(user_id) {
            Some(state) => format!("🏁 Ended the {} game.", state.kind()),
            None => "There's no game running.".to_string(),
        },
        ChatCommand::Help => format!(
            "/reset - forget our conversation\n/game <type> - start a game\n/endgame - stop the game\n{}",
            game_list()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::{ChatConfig, GeneratorConfig, Persona};
    use parley_llm::MockProvider;
    use std::sync::Arc;

    fn engine() -> ChatEngine {
        let config = ChatConfig {
            cooldown_ms: 0,
            ..ChatConfig::default()
        };
        let generator = GeneratorConfig::from_chat(&config, "test-model");
        ChatEngine::new(config, generator, Persona::default(), Arc::new(MockProvider::new()))
            .unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(ChatCommand::parse("hello"), None);
        assert_eq!(ChatCommand::parse("/reset"), Some(Ok(ChatCommand::Reset)));
        assert_eq!(ChatCommand::parse(" /ENDGAME "), Some(Ok(ChatCommand::EndGame)));
        assert_eq!(
            ChatCommand::parse("/game riddle"),
            Some(Ok(ChatCommand::Game(GameKind::Riddle)))
        );
        assert_eq!(
            ChatCommand::parse("/game  20q"),
            Some(Ok(ChatCommand::Game(GameKind::Guessing)))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(ChatCommand::parse("/game"), Some(Err(msg)) if msg.contains("riddle")));
        assert!(matches!(ChatCommand::parse("/game chess"), Some(Err(_))));
        assert!(matches!(ChatCommand::parse("/dance"), Some(Err(msg)) if msg.contains("/dance")));
    }

    #[tokio::test]
    async fn test_reset_clears_session() {
        let engine = engine();
        engine.respond("alice", "c1", "hello").await;
        assert_eq!(engine.session_len("alice"), 2);

        execute_command(&engine, "alice", ChatCommand::Reset);
        assert_eq!(engine.session_len("alice"), 0);
    }

    #[test]
    fn test_game_lifecycle() {
        let engine = engine();
        let opening = execute_command(&engine, "alice", ChatCommand::Game(GameKind::Story));
        assert!(opening.contains("story"));
        assert!(engine.active_game("alice").is_some());

        let reply = execute_command(&engine, "alice", ChatCommand::EndGame);
        assert!(reply.contains("story-building"));
        assert_eq!(
            execute_command(&engine, "alice", ChatCommand::EndGame),
            "There's no game running."
        );
    }

    #[test]
    fn test_unknown_game_leaves_no_state() {
        let engine = engine();
        let reply = match ChatCommand::parse("/game chess") {
            Some(Err(message)) => message,
            other => panic!("unexpected parse: {:?}", other),
        };
        assert!(reply.contains("chess"));
        assert!(engine.active_game("alice").is_none());
        let text = tokio_test::block_on(engine.respond("alice", "c1", "hi"));
        assert_eq!(text, "mock response");
    }
}
