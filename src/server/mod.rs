//! Server module for Parley
//!
//! - `config`: configuration structures
//! - `loader`: configuration loading from files and environment
//! - `providers`: completion provider and engine construction
//! - `shutdown`: signal handling
//! - `init`: the `serve` run loop

pub mod config;
mod init;
mod loader;
mod providers;
mod shutdown;

pub use init::run;
pub use loader::load_config;
pub use providers::{build_engine, resolve_llm_provider};
