//! Parley Channels - Chat Transports
//!
//! This crate connects the session engine to messaging platforms:
//! - Discord (via serenity)
//! - Text commands shared by every transport (`/reset`, `/game`, `/endgame`)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod command;
pub mod discord;
pub mod error;
pub mod message;
pub mod util;

pub use command::{execute_command, ChatCommand};
pub use discord::{DiscordAdapter, DiscordConfig};
pub use error::{Error, Result};
pub use message::{ChannelAdapter, ChannelType, NormalizedMessage, OutgoingMessage};
