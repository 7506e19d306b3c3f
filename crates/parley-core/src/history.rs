//! Channel-level shared history
//!
//! Separate from per-user sessions: every message observed in a channel is
//! recorded here, and the generator reads the most recent few as background
//! for the prompt.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One remembered channel message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSnippet {
    /// Display name of the author
    pub author: String,
    /// Message text
    pub text: String,
    /// When it was observed
    pub at: DateTime<Utc>,
}

impl ChannelSnippet {
    /// Render as a single prompt line
    #[must_use]
    pub fn to_line(&self) -> String {
        format!("{}: {}", self.author, self.text)
    }
}

/// Channel history store
#[async_trait]
pub trait ChannelHistory: Send + Sync {
    /// Record a message
    async fn append(&self, channel_id: &str, author: &str, text: &str);

    /// Up to `limit` most recent messages, oldest first
    async fn recent(&self, channel_id: &str, limit: usize) -> Vec<ChannelSnippet>;
}

/// In-memory channel history with bounded retention per channel
#[derive(Debug)]
pub struct MemoryChannelHistory {
    retention: usize,
    channels: DashMap<String, VecDeque<ChannelSnippet>>,
}

impl MemoryChannelHistory {
    /// Create a store keeping at most `retention` messages per channel
    #[must_use]
    pub fn new(retention: usize) -> Self {
        Self {
            retention,
            channels: DashMap::new(),
        }
    }

    /// Number of channels with history
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Forget every channel
    pub fn dispose(&self) {
        self.channels.clear();
    }
}

#[async_trait]
impl ChannelHistory for MemoryChannelHistory {
    async fn append(&self, channel_id: &str, author: &str, text: &str) {
        if self.retention == 0 || text.trim().is_empty() {
            return;
        }
        let mut entries = self.channels.entry(channel_id.to_string()).or_default();
        entries.push_back(ChannelSnippet {
            author: author.to_string(),
            text: text.to_string(),
            at: Utc::now(),
        });
        while entries.len() > self.retention {
            entries.pop_front();
        }
    }

    async fn recent(&self, channel_id: &str, limit: usize) -> Vec<ChannelSnippet> {
        match self.channels.get(channel_id) {
            Some(entries) => {
                let skip = entries.len().saturating_sub(limit);
                entries.iter().skip(skip).cloned().collect()
            }
            None => Vec::new(),
        }
    }
}
