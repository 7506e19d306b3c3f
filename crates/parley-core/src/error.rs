//! Error types for parley-core
//!
//! Every way a chat request can fail to produce a model reply. None of these
//! escape the generator boundary: `ResponseGenerator::respond` renders them to
//! chat text with [`format_error_for_chat`].

use crate::persona::Persona;
use parley_llm::FailureClass;
use std::time::Duration;
use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Input was empty after trimming
    #[error("empty input")]
    EmptyInput,

    /// Rejected by the per-user cooldown
    #[error("throttled locally, retry in {}ms", retry_after.as_millis())]
    ThrottledLocally {
        /// Time left in the cooldown window
        retry_after: Duration,
    },

    /// Upstream kept rate limiting until retries ran out
    #[error("upstream rate limited after {attempts} attempts")]
    UpstreamRateLimited {
        /// Attempts made, including the first
        attempts: u32,
    },

    /// Upstream quota or billing exhausted
    #[error("upstream quota exceeded: {0}")]
    UpstreamQuotaExceeded(String),

    /// Upstream rejected our credentials
    #[error("upstream authentication failed: {0}")]
    UpstreamAuth(String),

    /// Any other upstream failure
    #[error("upstream error: {0}")]
    UpstreamUnknown(String),

    /// Configuration error (invalid settings)
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Map a provider failure onto the core taxonomy
    #[must_use]
    pub fn from_upstream(error: parley_llm::Error, attempts: u32) -> Self {
        match error.class() {
            FailureClass::RateLimited => Self::UpstreamRateLimited { attempts },
            FailureClass::QuotaExceeded => Self::UpstreamQuotaExceeded(error.to_string()),
            FailureClass::InvalidCredential => Self::UpstreamAuth(error.to_string()),
            FailureClass::Unknown => Self::UpstreamUnknown(error.to_string()),
        }
    }

}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Trait for user-friendly error messages
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get a suggestion for how to fix the error
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for Error {
    fn user_message(&self) -> String {
        match self {
            Error::EmptyInput => {
                "👀 You pinged me but didn't say anything. What's on your mind?".to_string()
            }
            Error::ThrottledLocally { retry_after } => {
                let secs = retry_after.as_millis().div_ceil(1000).max(1);
                format!("⏳ Whoa, slow down! Give me {} more second(s) to catch up.", secs)
            }
            Error::UpstreamRateLimited { .. } => {
                "⏳ I'm getting a lot of messages right now. Try again shortly.".to_string()
            }
            Error::UpstreamQuotaExceeded(_) => {
                "💳 My AI brain is out of credits right now.".to_string()
            }
            Error::UpstreamAuth(_) => "🔑 My AI connection isn't set up correctly.".to_string(),
            Error::UpstreamUnknown(_) => {
                "❌ Something went wrong while thinking about that.".to_string()
            }
            Error::Configuration(msg) => format!("⚙️ Configuration error: {}", msg),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Error::UpstreamQuotaExceeded(_) => {
                Some("💡 Let the bot owner know so they can check the billing settings.".to_string())
            }
            Error::UpstreamAuth(_) => {
                Some("💡 Let the bot owner know the API key needs attention.".to_string())
            }
            Error::UpstreamUnknown(_) => Some("💡 Please try again in a moment.".to_string()),
            Error::Configuration(_) => {
                Some("💡 Check config/default.toml or the PARLEY_* environment.".to_string())
            }
            _ => None,
        }
    }
}

/// Format an error for display in a chat message
///
/// Persona overrides win; otherwise the generic message plus suggestion.
pub fn format_error_for_chat(error: &Error, persona: &Persona) -> String {
    if let Some(reply) = persona.reply_override(error) {
        return reply.to_string();
    }

    let mut output = error.user_message();
    if let Some(suggestion) = error.suggestion() {
        output.push_str("\n\n");
        output.push_str(&suggestion);
    }
    output
}
