//! Provider and engine construction

use super::config::AppConfig;
use anyhow::{Context, Result};
use parley_core::ChatEngine;
use parley_llm::{LlmProvider, OpenAiCompatProvider};
use std::sync::Arc;
use tracing::info;

/// Build the completion provider from `[llm]`
pub fn resolve_llm_provider(config: &AppConfig) -> Result<Arc<dyn LlmProvider>> {
    let provider_config = config.llm.provider_config()?;
    let provider =
        OpenAiCompatProvider::new(provider_config).context("Failed to create completion provider")?;
    info!(
        provider = provider.name(),
        model = provider.default_model(),
        base_url = %config.llm.base_url,
        "Completion provider ready"
    );
    Ok(Arc::new(provider))
}

/// Build the chat engine around a provider
pub fn build_engine(config: &AppConfig, provider: Arc<dyn LlmProvider>) -> Result<Arc<ChatEngine>> {
    let engine = ChatEngine::new(
        config.chat.clone(),
        config.generator_config(),
        config.persona.clone(),
        provider,
    )
    .context("Failed to initialize chat engine")?;
    Ok(Arc::new(engine))
}
