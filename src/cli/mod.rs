//! CLI module for Parley
//!
//! - `serve`: run the Discord bot and the session sweeper
//! - `chat`: talk to the bot from the terminal
//! - `config`: print the effective configuration

use crate::server::config::AppConfig;
use clap::{Parser, Subcommand};

pub mod chat;
pub mod config;

/// Parley chat bot CLI
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "Conversational chat bot with per-user memory and mini-games")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the bot
    Serve,
    /// Chat with the bot in this terminal
    Chat,
    /// Print the effective configuration
    Config,
}

/// Run the CLI command
pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Serve) => crate::server::run(config).await,
        Some(Commands::Chat) => chat::run(config).await,
        Some(Commands::Config) => config::run(&config),
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}
