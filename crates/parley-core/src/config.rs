//! Chat engine configuration
//!
//! Deserialized from the `[chat]` table of the application config. Every
//! field has a default so partial tables are accepted.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the session engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Minimum interval between two accepted requests from one user
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    /// Exchanges (user + assistant pairs) kept per session
    #[serde(default = "default_max_turns_per_user")]
    pub max_turns_per_user: usize,
    /// Sessions kept after a sweep
    #[serde(default = "default_max_total_sessions")]
    pub max_total_sessions: usize,
    /// Idle time after which a session is swept
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    /// Estimated token budget for prior turns in a prompt
    #[serde(default = "default_context_budget_tokens")]
    pub context_budget_tokens: usize,
    /// Reply length cap in characters (marker included)
    #[serde(default = "default_max_reply_chars")]
    pub max_reply_chars: usize,
    /// Retries after the first rate-limited attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Linear backoff step; retry `n` waits `n * retry_step_ms`
    #[serde(default = "default_retry_step_ms")]
    pub retry_step_ms: u64,
    /// Sweeper period
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Messages retained per channel in the shared history
    #[serde(default = "default_channel_history_limit")]
    pub channel_history_limit: usize,
    /// Recent channel messages included in a prompt
    #[serde(default = "default_channel_snippets")]
    pub channel_snippets: usize,
}

fn default_cooldown_ms() -> u64 {
    3000
}
fn default_max_turns_per_user() -> usize {
    150
}
fn default_max_total_sessions() -> usize {
    1000
}
fn default_session_ttl_secs() -> u64 {
    3600
}
fn default_context_budget_tokens() -> usize {
    2000
}
fn default_max_reply_chars() -> usize {
    1900
}
fn default_max_retries() -> u32 {
    2
}
fn default_retry_step_ms() -> u64 {
    2000
}
fn default_sweep_interval_secs() -> u64 {
    300
}
fn default_channel_history_limit() -> usize {
    50
}
fn default_channel_snippets() -> usize {
    5
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
            max_turns_per_user: default_max_turns_per_user(),
            max_total_sessions: default_max_total_sessions(),
            session_ttl_secs: default_session_ttl_secs(),
            context_budget_tokens: default_context_budget_tokens(),
            max_reply_chars: default_max_reply_chars(),
            max_retries: default_max_retries(),
            retry_step_ms: default_retry_step_ms(),
            sweep_interval_secs: default_sweep_interval_secs(),
            channel_history_limit: default_channel_history_limit(),
            channel_snippets: default_channel_snippets(),
        }
    }
}

impl ChatConfig {
    /// Cooldown window
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Session idle TTL
    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Sweeper period
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Reject values that would make a store unusable
    pub fn validate(&self) -> Result<()> {
        let checks: [(&str, usize); 5] = [
            ("chat.max_turns_per_user", self.max_turns_per_user),
            ("chat.max_total_sessions", self.max_total_sessions),
            ("chat.context_budget_tokens", self.context_budget_tokens),
            ("chat.max_reply_chars", self.max_reply_chars),
            ("chat.channel_history_limit", self.channel_history_limit),
        ];
        for (field, value) in checks {
            if value == 0 {
                return Err(Error::Configuration(format!("{} must be positive", field)));
            }
        }
        if self.sweep_interval_secs == 0 {
            return Err(Error::Configuration(
                "chat.sweep_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_defaults() {
        let config = ChatConfig::default();
        assert_eq!(config.cooldown(), Duration::from_millis(3000));
        assert_eq!(config.max_turns_per_user, 150);
        assert_eq!(config.context_budget_tokens, 2000);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.retry_step_ms, 2000);
        assert_eq!(config.sweep_interval(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = ChatConfig {
            max_total_sessions: 0,
            ..ChatConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_total_sessions"));
    }
}
