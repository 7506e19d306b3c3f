//! Per-user request cooldown
//!
//! Fixed-window throttle: a request is accepted when at least `window` has
//! passed since the user's last *accepted* request. Rejections leave the
//! stored timestamp untouched.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::Duration;

/// Per-user cooldown gate
#[derive(Debug)]
pub struct CooldownGate {
    window: Duration,
    last_accepted: DashMap<String, DateTime<Utc>>,
}

impl CooldownGate {
    /// Create a gate with the given window
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: DashMap::new(),
        }
    }

    /// Cooldown window
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Accept or reject a request at `now`
    ///
    /// On rejection returns the time left in the window. A timestamp in the
    /// future (clock stepped backwards) counts as expired.
    pub fn acquire(&self, user_id: &str, now: DateTime<Utc>) -> Result<(), Duration> {
        match self.last_accepted.entry(user_id.to_string()) {
            Entry::Occupied(mut entry) => {
                if let Ok(elapsed) = now.signed_duration_since(*entry.get()).to_std() {
                    if elapsed < self.window {
                        return Err(self.window - elapsed);
                    }
                }
                entry.insert(now);
                Ok(())
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                Ok(())
            }
        }
    }

    /// Boolean form of [`acquire`](Self::acquire)
    pub fn try_accept(&self, user_id: &str, now: DateTime<Utc>) -> bool {
        self.acquire(user_id, now).is_ok()
    }

    /// Last accepted request time
    #[must_use]
    pub fn last_accepted(&self, user_id: &str) -> Option<DateTime<Utc>> {
        self.last_accepted.get(user_id).map(|t| *t)
    }

    /// Forget a user
    pub fn remove(&self, user_id: &str) -> bool {
        self.last_accepted.remove(user_id).is_some()
    }

    /// Keep only users matching the predicate; returns how many were dropped
    pub fn retain_users<F>(&self, mut keep: F) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        let before = self.last_accepted.len();
        self.last_accepted.retain(|user_id, _| keep(user_id.as_str()));
        before.saturating_sub(self.last_accepted.len())
    }

    /// Tracked users
    #[must_use]
    pub fn users(&self) -> Vec<String> {
        self.last_accepted.iter().map(|e| e.key().clone()).collect()
    }

    /// Number of tracked users
    #[must_use]
    pub fn len(&self) -> usize {
        self.last_accepted.len()
    }

    /// Whether no user is tracked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last_accepted.is_empty()
    }

    /// Drop every entry
    pub fn dispose(&self) {
        self.last_accepted.clear();
    }
}
