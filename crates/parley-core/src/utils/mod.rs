//! Utility modules for parley-core
//!
//! - retry: bounded retry with linear backoff

mod retry;

pub use retry::{retry_with_backoff, retry_with_delay, Backoff, RetryConfig, RetryError};
