//! Periodic maintenance
//!
//! A sweep evicts sessions (TTL, then capacity) and afterwards drops cooldown
//! and game entries whose user no longer has a session. Runs never overlap:
//! a run that finds another in progress is skipped.

use crate::cooldown::CooldownGate;
use crate::game::GameSessions;
use crate::memory::{SessionStore, SweepStats};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Outcome of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Session store pass
    pub sessions: SweepStats,
    /// Orphaned cooldown entries removed
    pub cooldowns_removed: usize,
    /// Orphaned games removed
    pub games_removed: usize,
}

/// Single-flight sweeper over all stores
pub struct Sweeper {
    sessions: Arc<SessionStore>,
    cooldown: Arc<CooldownGate>,
    games: Arc<GameSessions>,
    running: Mutex<()>,
}

impl Sweeper {
    /// Create a sweeper
    #[must_use]
    pub fn new(
        sessions: Arc<SessionStore>,
        cooldown: Arc<CooldownGate>,
        games: Arc<GameSessions>,
    ) -> Self {
        Self {
            sessions,
            cooldown,
            games,
            running: Mutex::new(()),
        }
    }

    /// Run one sweep at `now`
    ///
    /// Returns `None` when another run is already in progress.
    pub fn run(&self, now: DateTime<Utc>) -> Option<SweepReport> {
        let Ok(_guard) = self.running.try_lock() else {
            debug!("Sweep already in progress, skipping");
            return None;
        };

        let sessions = self.sessions.sweep(now);
        let cooldowns_removed = self.cooldown.retain_users(|user| self.sessions.contains(user));
        let games_removed = self.games.retain_users(|user| self.sessions.contains(user));

        let report = SweepReport {
            sessions,
            cooldowns_removed,
            games_removed,
        };
        if cooldowns_removed > 0 || games_removed > 0 {
            info!(
                cooldowns_removed = cooldowns_removed,
                games_removed = games_removed,
                "Removed orphaned entries"
            );
        } else {
            debug!(remaining = sessions.remaining, "Sweep complete");
        }
        Some(report)
    }

    /// Run a sweep every `interval` until `cancel` fires
    ///
    /// The first sweep happens one full interval after spawning.
    pub fn spawn(self: Arc<Self>, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_secs = interval.as_secs(), "Session sweeper started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.run(Utc::now());
                    }
                    _ = cancel.cancelled() => {
                        info!("Session sweeper shutting down");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameKind;
    use crate::memory::Turn;
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    fn sweeper(max_sessions: usize) -> (Sweeper, Arc<SessionStore>, Arc<CooldownGate>, Arc<GameSessions>) {
        let sessions = Arc::new(SessionStore::new(150, max_sessions, Duration::from_secs(3600)));
        let cooldown = Arc::new(CooldownGate::new(Duration::from_secs(3)));
        let games = Arc::new(GameSessions::new());
        let sweeper = Sweeper::new(Arc::clone(&sessions), Arc::clone(&cooldown), Arc::clone(&games));
        (sweeper, sessions, cooldown, games)
    }

    #[test]
    fn test_orphans_removed_with_expired_session() {
        let (sweeper, sessions, cooldown, games) = sweeper(10);
        for user in ["alice", "bob"] {
            sessions.append_turn(user, Turn::user("hi", base()));
            cooldown.acquire(user, base()).unwrap();
            games.start_kind(user, GameKind::Story, base());
        }
        sessions.append_turn("bob", Turn::user("still here", base() + ChronoDuration::minutes(90)));

        let report = sweeper.run(base() + ChronoDuration::minutes(100)).unwrap();

        assert_eq!(report.sessions.expired, 1);
        assert_eq!(report.cooldowns_removed, 1);
        assert_eq!(report.games_removed, 1);
        assert_eq!(cooldown.users(), vec!["bob".to_string()]);
        assert_eq!(games.users(), vec!["bob".to_string()]);
    }

    #[test]
    fn test_entries_without_session_are_removed() {
        let (sweeper, _sessions, cooldown, games) = sweeper(10);
        // Throttled by cooldown before ever reaching the store
        cooldown.acquire("ghost", base()).unwrap();
        games.start_kind("ghost", GameKind::Riddle, base());

        sweeper.run(base()).unwrap();
        assert!(cooldown.is_empty());
        assert!(games.is_empty());
    }

    #[test]
    fn test_invariants_hold_after_run() {
        let (sweeper, sessions, cooldown, games) = sweeper(3);
        for i in 0..8 {
            let user = format!("user{}", i);
            let at = base() + ChronoDuration::seconds(i);
            sessions.append_turn(&user, Turn::user("hi", at));
            cooldown.acquire(&user, at).unwrap();
            games.start_kind(&user, GameKind::Guessing, at);
        }

        sweeper.run(base() + ChronoDuration::minutes(1)).unwrap();

        assert!(sessions.len() <= 3);
        for user in cooldown.users().iter().chain(games.users().iter()) {
            assert!(sessions.contains(user), "orphan {}", user);
        }
    }

    #[test]
    fn test_run_is_idempotent() {
        let (sweeper, sessions, _, _) = sweeper(2);
        for i in 0..4 {
            sessions.append_turn(&format!("user{}", i), Turn::user("hi", base()));
        }
        let now = base() + ChronoDuration::minutes(1);
        let first = sweeper.run(now).unwrap();
        let second = sweeper.run(now).unwrap();
        assert_eq!(first.sessions.evicted, 2);
        assert_eq!(second.sessions.expired + second.sessions.evicted, 0);
        assert_eq!(second.sessions.remaining, 2);
    }

    #[tokio::test]
    async fn test_overlapping_run_is_skipped() {
        let (sweeper, _, _, _) = sweeper(2);
        let _held = sweeper.running.lock().await;
        assert!(sweeper.run(base()).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_sweeper_stops_on_cancel() {
        let (sweeper, sessions, _, _) = sweeper(10);
        sessions.append_turn("alice", Turn::user("hi", base()));
        let cancel = CancellationToken::new();
        let handle = Arc::new(sweeper).spawn(Duration::from_secs(300), cancel.clone());

        // Wall-clock now is far past the turn, so the first tick expires it
        tokio::time::sleep(Duration::from_secs(301)).await;
        tokio::task::yield_now().await;
        assert!(!sessions.contains("alice"));

        cancel.cancel();
        handle.await.unwrap();
    }
}
