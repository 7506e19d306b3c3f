//! Session store
//!
//! One session per user, created lazily on the first append. Each session
//! holds at most `2 * max_turns_per_user` turns. `sweep` evicts idle sessions
//! (TTL) and then the least recently active ones beyond `max_total_sessions`.
//!
//! All mutation happens under a single write lock, and a sweep assembles the
//! complete replacement map before installing it, so readers never observe a
//! half-swept store.

use super::session::{Session, Turn};
use crate::config::ChatConfig;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, info};

/// Outcome of one [`SessionStore::sweep`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Sessions dropped for exceeding the TTL
    pub expired: usize,
    /// Sessions dropped to get back under capacity
    pub evicted: usize,
    /// Turns that had their missing timestamp filled in
    pub backfilled: usize,
    /// Sessions left after the sweep
    pub remaining: usize,
}

/// In-memory per-user session store
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    max_turns_per_user: usize,
    max_total_sessions: usize,
    ttl: Duration,
}

impl SessionStore {
    /// Create a store
    #[must_use]
    pub fn new(max_turns_per_user: usize, max_total_sessions: usize, ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_turns_per_user,
            max_total_sessions,
            ttl,
        }
    }

    /// Create a store from chat configuration
    #[must_use]
    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(
            config.max_turns_per_user,
            config.max_total_sessions,
            config.session_ttl(),
        )
    }

    /// Maximum turns kept per session (two per exchange)
    #[must_use]
    pub fn turn_cap(&self) -> usize {
        self.max_turns_per_user.saturating_mul(2)
    }

    /// Maximum sessions kept after a sweep
    #[must_use]
    pub fn max_total_sessions(&self) -> usize {
        self.max_total_sessions
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Session>> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Session>> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot of a user's session (empty when absent; nothing is created)
    #[must_use]
    pub fn get(&self, user_id: &str) -> Session {
        self.read().get(user_id).cloned().unwrap_or_default()
    }

    /// Append a turn and trim to the most recent `turn_cap()` turns
    ///
    /// Returns the session length after trimming.
    pub fn append_turn(&self, user_id: &str, turn: Turn) -> usize {
        let cap = self.turn_cap();
        let mut sessions = self.write();
        let session = sessions.entry(user_id.to_string()).or_default();
        session.push_bounded(turn, cap);
        session.len()
    }

    /// Remove a user's session
    ///
    /// The caller is responsible for dropping the user's cooldown and game
    /// entries as well; `ChatEngine::clear_user` does all three.
    pub fn clear(&self, user_id: &str) -> bool {
        self.write().remove(user_id).is_some()
    }

    /// Whether a session exists for the user
    #[must_use]
    pub fn contains(&self, user_id: &str) -> bool {
        self.read().contains_key(user_id)
    }

    /// Users with a session
    #[must_use]
    pub fn users(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Number of sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Drop every session
    pub fn dispose(&self) {
        self.write().clear();
    }

    /// Evict idle and excess sessions
    ///
    /// 1. Unstamped turns get `now` as their timestamp, so a session without
    ///    timestamps is treated as fresh on the sweep that first sees it.
    /// 2. TTL pass: sessions whose last activity is more than `ttl` before
    ///    `now` are dropped.
    /// 3. Capacity pass: if more than `max_total_sessions` remain, only the
    ///    most recently active ones are kept.
    pub fn sweep(&self, now: DateTime<Utc>) -> SweepStats {
        let mut sessions = self.write();
        let mut stats = SweepStats::default();

        let mut survivors: Vec<(String, Session, DateTime<Utc>)> = Vec::with_capacity(sessions.len());
        for (user_id, mut session) in sessions.drain() {
            stats.backfilled += session.backfill_timestamps(now);
            let last = session.last_activity().unwrap_or(now);
            let idle = now.signed_duration_since(last).to_std().unwrap_or(Duration::ZERO);
            if idle > self.ttl {
                debug!(user_id = %user_id, idle_secs = idle.as_secs(), "Session expired");
                stats.expired += 1;
                continue;
            }
            survivors.push((user_id, session, last));
        }

        if survivors.len() > self.max_total_sessions {
            // Most recent first; user id breaks ties so eviction is deterministic
            survivors.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
            stats.evicted = survivors.len() - self.max_total_sessions;
            survivors.truncate(self.max_total_sessions);
        }

        let next: HashMap<String, Session> = survivors
            .into_iter()
            .map(|(user_id, session, _)| (user_id, session))
            .collect();
        stats.remaining = next.len();
        *sessions = next;

        if stats.expired > 0 || stats.evicted > 0 {
            info!(
                expired = stats.expired,
                evicted = stats.evicted,
                remaining = stats.remaining,
                "Session sweep evicted sessions"
            );
        }
        stats
    }
}
