//! Memory - per-user conversation sessions
//!
//! - Turn: one role-tagged, timestamped message
//! - Session: a user's chronologically ordered turns
//! - SessionStore: bounded in-process store with TTL and capacity sweeps
//!
//! Sessions are volatile by design: nothing here survives a restart.

mod session;
mod store;

pub use session::{Session, Turn, TurnRole};
pub use store::{SessionStore, SweepStats};
