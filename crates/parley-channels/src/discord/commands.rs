use crate::command::ChatCommand;
use parley_core::GameKind;
use serenity::all::{CommandOptionType, CreateCommand, CreateCommandOption};

/// Name of the option carrying the game type
pub const GAME_OPTION: &str = "type";

/// Slash command definitions registered on startup
#[must_use]
pub fn slash_commands() -> Vec<CreateCommand> {
    let game_option = GameKind::ALL.iter().fold(
        CreateCommandOption::new(CommandOptionType::String, GAME_OPTION, "Which game to play")
            .required(true),
        |option, kind| option.add_string_choice(kind.as_str(), kind.as_str()),
    );

    vec![
        CreateCommand::new("reset").description("Forget our conversation"),
        CreateCommand::new("game")
            .description("Start a mini-game")
            .add_option(game_option),
        CreateCommand::new("endgame").description("Stop the current game"),
    ]
}

/// Map a slash command invocation onto a [`ChatCommand`]
pub fn command_from_slash(name: &str, game: Option<&str>) -> Result<ChatCommand, String> {
    match name {
        "reset" => Ok(ChatCommand::Reset),
        "endgame" => Ok(ChatCommand::EndGame),
        "game" => game
            .ok_or_else(|| "Please pick a game type.".to_string())?
            .parse::<GameKind>()
            .map(ChatCommand::Game),
        other => Err(format!("Unknown command: {}", other)),
    }
}
