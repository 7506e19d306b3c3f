//! Parley Core - Conversational Session Engine
//!
//! This crate provides the per-user chat machinery behind the Parley bot:
//! - Cooldown: fixed-window per-user request throttle
//! - Memory: bounded per-user conversation sessions with TTL/capacity sweeps
//! - Game: single-slot interactive mini-games layered over normal chat
//! - Context: token-budgeted context window selection
//! - Generator: prompt assembly and retrying completion calls
//! - Sweeper: periodic, single-flight maintenance across all stores
//! - Engine: composition root wiring the pieces together

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod context;
pub mod cooldown;
pub mod engine;
pub mod error;
pub mod game;
pub mod generator;
pub mod history;
pub mod memory;
pub mod persona;
pub mod sweeper;
pub mod utils;

pub use config::ChatConfig;
pub use context::ContextWindowBuilder;
pub use cooldown::CooldownGate;
pub use engine::ChatEngine;
pub use error::{format_error_for_chat, Error, Result, UserFriendlyError};
pub use game::{GameKind, GamePayload, GameProgress, GameSessions, GameState};
pub use generator::{GenerateRequest, GeneratorConfig, ResponseGenerator};
pub use history::{ChannelHistory, ChannelSnippet, MemoryChannelHistory};
pub use memory::{Session, SessionStore, SweepStats, Turn, TurnRole};
pub use persona::Persona;
pub use sweeper::{SweepReport, Sweeper};
pub use utils::{retry_with_backoff, Backoff, RetryConfig, RetryError};
