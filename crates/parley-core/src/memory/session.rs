//! Turns and sessions

use chrono::{DateTime, Utc};
use parley_llm::{Message, MessageRole};
use serde::{Deserialize, Serialize};

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// The chatting user
    User,
    /// The bot
    Assistant,
}

impl From<TurnRole> for MessageRole {
    fn from(role: TurnRole) -> Self {
        match role {
            TurnRole::User => MessageRole::User,
            TurnRole::Assistant => MessageRole::Assistant,
        }
    }
}

/// One message in a session
///
/// Immutable once stored, except that a missing timestamp may be filled in
/// once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Author role
    pub role: TurnRole,
    /// Text content
    pub content: String,
    /// Creation time, if known
    pub created_at: Option<DateTime<Utc>>,
}

impl Turn {
    /// User turn stamped at `at`
    #[must_use]
    pub fn user(content: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            created_at: Some(at),
        }
    }

    /// Assistant turn stamped at `at`
    #[must_use]
    pub fn assistant(content: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            created_at: Some(at),
        }
    }

    /// Turn without a timestamp
    #[must_use]
    pub fn unstamped(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: None,
        }
    }

    /// Fill in the timestamp if it is missing; returns whether it changed
    pub fn stamp_if_missing(&mut self, at: DateTime<Utc>) -> bool {
        if self.created_at.is_some() {
            return false;
        }
        self.created_at = Some(at);
        true
    }

    /// Whether the content is empty or whitespace only
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Convert to a completion message
    #[must_use]
    pub fn to_message(&self) -> Message {
        Message::new(self.role.into(), self.content.clone())
    }
}

/// A user's conversation memory, oldest turn first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    turns: Vec<Turn>,
}

impl Session {
    /// Empty session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns in chronological order
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether there are no turns
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Timestamp of the most recent stamped turn
    #[must_use]
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.turns.iter().rev().find_map(|t| t.created_at)
    }

    /// Most recent turn
    #[must_use]
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Append a turn, then drop the oldest turns beyond `cap`
    pub(crate) fn push_bounded(&mut self, turn: Turn, cap: usize) {
        self.turns.push(turn);
        if self.turns.len() > cap {
            let excess = self.turns.len() - cap;
            self.turns.drain(..excess);
        }
    }

    /// Stamp every unstamped turn; returns how many were stamped
    pub(crate) fn backfill_timestamps(&mut self, at: DateTime<Utc>) -> usize {
        self.turns
            .iter_mut()
            .map(|t| t.stamp_if_missing(at))
            .filter(|changed| *changed)
            .count()
    }
}

impl From<Vec<Turn>> for Session {
    fn from(turns: Vec<Turn>) -> Self {
        Self { turns }
    }
}
