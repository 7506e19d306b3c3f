//! `parley chat`: terminal REPL against the same engine the bot uses

use crate::server::config::AppConfig;
use crate::server::{build_engine, resolve_llm_provider};
use anyhow::{Context, Result};
use parley_channels::{execute_command, ChatCommand};
use parley_core::ChatEngine;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const LOCAL_USER: &str = "local";
const LOCAL_CHANNEL: &str = "terminal";

/// Run the REPL until `/quit` or end of input
pub async fn run(config: AppConfig) -> Result<()> {
    let provider = resolve_llm_provider(&config)?;
    let engine = build_engine(&config, provider)?;

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(
            format!(
                "Chatting with {}. Commands: /reset, /game <type>, /endgame, /quit\n",
                engine.persona().name
            )
            .as_bytes(),
        )
        .await?;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };
        let line = line.trim();
        if line.eq_ignore_ascii_case("/quit") || line.eq_ignore_ascii_case("/exit") {
            break;
        }

        let reply = handle_line(&engine, line).await;
        stdout
            .write_all(format!("{}: {}\n", engine.persona().name, reply).as_bytes())
            .await?;
    }

    engine.dispose();
    Ok(())
}

async fn handle_line(engine: &ChatEngine, line: &str) -> String {
    match ChatCommand::parse(line) {
        Some(Ok(command)) => execute_command(engine, LOCAL_USER, command),
        Some(Err(message)) => message,
        None => engine.respond(LOCAL_USER, LOCAL_CHANNEL, line).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::{ChatConfig, GeneratorConfig, Persona};
    use parley_llm::MockProvider;
    use std::sync::Arc;

    fn engine(provider: MockProvider) -> ChatEngine {
        let config = ChatConfig {
            cooldown_ms: 0,
            ..ChatConfig::default()
        };
        let generator = GeneratorConfig::from_chat(&config, "test-model");
        ChatEngine::new(config, generator, Persona::default(), Arc::new(provider)).unwrap()
    }

    #[tokio::test]
    async fn test_handle_line_routes_commands() {
        let provider = MockProvider::new();
        provider.push_reply("hello human");
        let engine = engine(provider.clone());

        assert_eq!(handle_line(&engine, "hi").await, "hello human");
        assert_eq!(engine.session_len(LOCAL_USER), 2);

        handle_line(&engine, "/reset").await;
        assert_eq!(engine.session_len(LOCAL_USER), 0);
        assert_eq!(provider.call_count(), 1);
    }
}
