//! Parley LLM - Completion Service Abstraction
//!
//! This crate provides the text-completion seam used by the chat engine:
//! - Message: role-tagged conversation messages
//! - Completion: request/response types and sampling parameters
//! - Provider: the `LlmProvider` trait
//! - OpenAI: an OpenAI-compatible chat-completions provider
//! - Mock: a scripted provider for tests and offline runs
//! - Error: failure classification (rate limit, quota, credentials, unknown)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod completion;
pub mod error;
pub mod message;
pub mod mock;
pub mod openai;
pub mod provider;
pub mod token;
pub mod util;

pub use completion::{CompletionRequest, CompletionResponse, TokenUsage};
pub use error::{Error, FailureClass, Result};
pub use message::{Message, MessageRole};
pub use mock::MockProvider;
pub use openai::{OpenAiCompatConfig, OpenAiCompatProvider};
pub use provider::LlmProvider;
pub use token::estimate_tokens;
