//! `parley config`

use crate::server::config::AppConfig;
use anyhow::{Context, Result};
use parley_llm::util::mask_api_key;

/// Print the effective configuration as TOML
pub fn run(config: &AppConfig) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
    println!("{}", rendered);

    let key_env = &config.llm.api_key_env;
    let key_status = match std::env::var(key_env) {
        Ok(key) if !key.trim().is_empty() => mask_api_key(&key),
        _ => "(not set)".to_string(),
    };
    println!("# {} = {}", key_env, key_status);

    let discord = if std::env::var("DISCORD_BOT_TOKEN").is_ok() {
        "set"
    } else {
        "(not set)"
    };
    println!("# DISCORD_BOT_TOKEN = {}", discord);
    Ok(())
}
