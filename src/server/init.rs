//! `parley serve`

use super::config::AppConfig;
use super::providers::{build_engine, resolve_llm_provider};
use super::shutdown::cancel_on_signal;
use anyhow::{Context, Result};
use parley_channels::DiscordAdapter;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Run the bot until a shutdown signal arrives
pub async fn run(config: AppConfig) -> Result<()> {
    let provider = resolve_llm_provider(&config)?;
    let engine = build_engine(&config, provider)?;

    let shutdown = CancellationToken::new();
    cancel_on_signal(shutdown.clone());

    let sweeper = engine.spawn_sweeper(config.chat.sweep_interval(), shutdown.child_token());

    if config.discord.enabled {
        let adapter = Arc::new(DiscordAdapter::from_env().context("Discord is enabled but not configured")?);
        info!("Discord adapter starting");
        adapter
            .run(Arc::clone(&engine), shutdown.child_token())
            .await
            .context("Discord adapter stopped with an error")?;
    } else {
        warn!("No transport enabled; running the sweeper only");
        shutdown.cancelled().await;
    }

    shutdown.cancel();
    if let Err(e) = sweeper.await {
        warn!(error = %e, "Sweeper task ended abnormally");
    }
    engine.dispose();
    info!("Parley stopped");
    Ok(())
}
