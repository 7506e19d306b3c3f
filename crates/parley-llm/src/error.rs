//! Error types for parley-llm
//!
//! Every provider failure maps onto one [`FailureClass`]. The chat engine only
//! looks at the class to decide between retrying and giving up.

use thiserror::Error;

/// Coarse classification of a completion failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// Upstream asked us to slow down; worth retrying
    RateLimited,
    /// Billing or quota exhausted
    QuotaExceeded,
    /// Missing or rejected credentials
    InvalidCredential,
    /// Anything else (transport, malformed response, server error)
    Unknown,
}

impl FailureClass {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::QuotaExceeded => "quota_exceeded",
            Self::InvalidCredential => "invalid_credential",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// LLM error type
#[derive(Debug, Error)]
pub enum Error {
    /// Provider not configured
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// Rate limit exceeded
    #[error("rate limit exceeded")]
    RateLimit {
        /// Seconds until retry is allowed, when upstream says so
        retry_after: Option<u64>,
    },

    /// Quota or billing limit exhausted
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Credentials rejected
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API error
    #[error("api error: {0}")]
    Api(String),

    /// Invalid response
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),
}

impl Error {
    /// Classify this error
    #[must_use]
    pub fn class(&self) -> FailureClass {
        match self {
            Self::RateLimit { .. } => FailureClass::RateLimited,
            Self::QuotaExceeded(_) => FailureClass::QuotaExceeded,
            Self::Auth(_) | Self::NotConfigured(_) => FailureClass::InvalidCredential,
            Self::Api(_) | Self::InvalidResponse(_) | Self::Network(_) => FailureClass::Unknown,
        }
    }

    /// Whether a retry could plausibly succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.class() == FailureClass::RateLimited
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
