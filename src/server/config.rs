//! Application configuration types

use anyhow::{Context, Result};
use parley_core::{ChatConfig, GeneratorConfig, Persona};
use parley_llm::OpenAiCompatConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub persona: Persona,
    #[serde(default)]
    pub discord: DiscordAppConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        self.chat.validate().context("Invalid [chat] configuration")?;
        if self.llm.model.trim().is_empty() {
            anyhow::bail!("llm.model must not be empty");
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            anyhow::bail!("llm.temperature must be between 0.0 and 2.0");
        }
        Ok(())
    }

    /// Generator settings derived from `[chat]` and `[llm]`
    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig::from_chat(&self.chat, self.llm.model.clone())
            .with_max_tokens(self.llm.max_tokens)
            .with_temperature(self.llm.temperature)
    }
}

/// Completion service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    parley_llm::openai::OPENAI_API_BASE.to_string()
}

fn default_model() -> String {
    parley_llm::openai::DEFAULT_MODEL.to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_temperature() -> f32 {
    0.8
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Provider configuration with the key read from `api_key_env`
    pub fn provider_config(&self) -> Result<OpenAiCompatConfig> {
        let config = OpenAiCompatConfig::from_env(&self.api_key_env)
            .with_context(|| format!("Set {} to your completion API key", self.api_key_env))?;
        Ok(config
            .with_base_url(self.base_url.clone())
            .with_model(self.model.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs)))
    }
}

/// Discord transport switch; credentials come from `DISCORD_*` env vars
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordAppConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DiscordAppConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub format: LogFormat,
}
