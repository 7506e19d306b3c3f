//! Mock LLM Provider for testing
//!
//! Replies are taken from a queue of scripted results; once the queue is empty
//! the provider answers with a fixed default text. Every request is recorded.

use crate::completion::{CompletionRequest, CompletionResponse};
use crate::error::Result;
use crate::provider::LlmProvider;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Default reply when the script is exhausted
pub const DEFAULT_MOCK_REPLY: &str = "mock response";

/// A mock LLM provider that returns queued results or a default reply.
#[derive(Clone, Default)]
pub struct MockProvider {
    script: Arc<Mutex<VecDeque<Result<String>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn push_reply(&self, text: impl Into<String>) {
        self.push_result(Ok(text.into()));
    }

    /// Queue an arbitrary result (use this to script failures).
    pub fn push_result(&self, result: Result<String>) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(result);
    }

    /// Number of `complete` calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Snapshot of every request received.
    #[must_use]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The most recent request, if any.
    #[must_use]
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }
}

#[async_trait::async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        match next {
            Some(Ok(text)) => Ok(CompletionResponse::text(text, "mock-model")),
            Some(Err(e)) => Err(e),
            None => Ok(CompletionResponse::text(DEFAULT_MOCK_REPLY, "mock-model")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::message::Message;

    #[tokio::test]
    async fn test_scripted_results_in_order() {
        let provider = MockProvider::new();
        provider.push_result(Err(Error::RateLimit { retry_after: None }));
        provider.push_reply("second");

        let request = CompletionRequest::new("").with_message(Message::user("hi"));
        assert!(provider.complete(request.clone()).await.is_err());
        let response = provider.complete(request.clone()).await.unwrap();
        assert_eq!(response.content, "second");
        let response = provider.complete(request).await.unwrap();
        assert_eq!(response.content, DEFAULT_MOCK_REPLY);

        assert_eq!(provider.call_count(), 3);
        assert_eq!(provider.last_request().unwrap().messages[0].content, "hi");
    }

    #[test]
    fn test_clones_share_script() {
        let provider = MockProvider::new();
        let handle = provider.clone();
        handle.push_reply("from clone");

        let response =
            tokio_test::block_on(provider.complete(CompletionRequest::new("m"))).unwrap();
        assert_eq!(response.content, "from clone");
        assert_eq!(handle.call_count(), 1);
    }
}
