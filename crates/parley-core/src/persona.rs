//! Persona - bot character and canned replies
//!
//! The persona supplies the system instructions placed at the top of every
//! prompt, and optional replies that replace the built-in error messages.

use crate::error::Error;
use serde::{Deserialize, Serialize};

/// Bot persona
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Display name
    #[serde(default = "default_name")]
    pub name: String,
    /// System instructions
    #[serde(default = "default_instructions")]
    pub instructions: String,
    /// Reply to an empty message
    #[serde(default)]
    pub empty_input_reply: Option<String>,
    /// Reply while the user is cooling down
    #[serde(default)]
    pub cooldown_reply: Option<String>,
    /// Reply after upstream rate limiting exhausted the retries
    #[serde(default)]
    pub rate_limited_reply: Option<String>,
    /// Reply when the upstream quota is exhausted
    #[serde(default)]
    pub quota_reply: Option<String>,
    /// Reply when upstream credentials are rejected
    #[serde(default)]
    pub auth_reply: Option<String>,
    /// Reply for any other upstream failure
    #[serde(default)]
    pub unknown_reply: Option<String>,
}

fn default_name() -> String {
    "Parley".to_string()
}

fn default_instructions() -> String {
    "You are a friendly, witty chat companion in a community chat server. \
     Keep answers short and conversational, use the conversation history for \
     context, and never claim to be human."
        .to_string()
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: default_name(),
            instructions: default_instructions(),
            empty_input_reply: None,
            cooldown_reply: None,
            rate_limited_reply: None,
            quota_reply: None,
            auth_reply: None,
            unknown_reply: None,
        }
    }
}

impl Persona {
    /// Create a persona with custom name and instructions
    #[must_use]
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            ..Self::default()
        }
    }

    /// System prompt opening every completion request
    #[must_use]
    pub fn system_prompt(&self) -> String {
        format!("Your name is {}. {}", self.name, self.instructions.trim())
    }

    /// Persona-specific reply for an error, if one is configured
    #[must_use]
    pub fn reply_override(&self, error: &Error) -> Option<&str> {
        match error {
            Error::EmptyInput => self.empty_input_reply.as_deref(),
            Error::ThrottledLocally { .. } => self.cooldown_reply.as_deref(),
            Error::UpstreamRateLimited { .. } => self.rate_limited_reply.as_deref(),
            Error::UpstreamQuotaExceeded(_) => self.quota_reply.as_deref(),
            Error::UpstreamAuth(_) => self.auth_reply.as_deref(),
            Error::UpstreamUnknown(_) => self.unknown_reply.as_deref(),
            Error::Configuration(_) => None,
        }
    }
}
