//! Error types for parley-channels

use thiserror::Error;

/// Channel error type
#[derive(Debug, Error)]
pub enum Error {
    /// Discord error
    #[error("discord error: {0}")]
    Discord(String),

    /// Message parsing error
    #[error("message parsing error: {0}")]
    Parse(String),

    /// Missing or invalid transport configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Adapter used before it connected
    #[error("not connected")]
    NotConnected,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
