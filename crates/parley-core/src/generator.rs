//! Response generation
//!
//! One chat exchange: validate, throttle, record the user turn, assemble the
//! prompt (persona, game overlay, channel snippets, context window, new turn),
//! call the provider with bounded retry, clip the reply and record it.
//!
//! [`ResponseGenerator::generate`] returns a classified [`Error`] so callers
//! and tests can branch on the failure kind; [`ResponseGenerator::respond`] is
//! the outer boundary that always produces chat text.

use crate::config::ChatConfig;
use crate::context::ContextWindowBuilder;
use crate::cooldown::CooldownGate;
use crate::error::{format_error_for_chat, Error, Result};
use crate::game::GameSessions;
use crate::history::ChannelSnippet;
use crate::memory::{SessionStore, Turn};
use crate::persona::Persona;
use crate::utils::{retry_with_backoff, Backoff, RetryConfig, RetryError};
use chrono::Utc;
use parley_llm::{CompletionRequest, LlmProvider, Message};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Marker appended to clipped replies
pub const TRUNCATION_MARKER: char = '…';

/// Completion parameters and limits
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Model name sent to the provider
    pub model: String,
    /// Max output tokens
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Context window budget in estimated tokens
    pub context_budget_tokens: usize,
    /// Reply cap in characters, marker included
    pub max_reply_chars: usize,
    /// Retry policy for rate-limited calls
    pub retry: RetryConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::from_chat(&ChatConfig::default(), parley_llm::openai::DEFAULT_MODEL)
    }
}

impl GeneratorConfig {
    /// Derive limits from chat configuration
    #[must_use]
    pub fn from_chat(chat: &ChatConfig, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_tokens: 500,
            temperature: 0.8,
            context_budget_tokens: chat.context_budget_tokens,
            max_reply_chars: chat.max_reply_chars,
            retry: RetryConfig::default()
                .with_max_retries(chat.max_retries)
                .with_backoff(Backoff::linear(Duration::from_millis(chat.retry_step_ms))),
        }
    }

    /// Set the output token limit
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// One inbound chat message to answer
#[derive(Debug, Clone, Copy)]
pub struct GenerateRequest<'a> {
    /// Sender
    pub user_id: &'a str,
    /// Raw message text
    pub input: &'a str,
    /// Persona to answer as
    pub persona: &'a Persona,
    /// Recent channel messages, oldest first
    pub channel_snippets: &'a [ChannelSnippet],
}

impl<'a> GenerateRequest<'a> {
    /// Create a request without channel snippets
    #[must_use]
    pub fn new(user_id: &'a str, input: &'a str, persona: &'a Persona) -> Self {
        Self {
            user_id,
            input,
            persona,
            channel_snippets: &[],
        }
    }

    /// Attach recent channel messages
    #[must_use]
    pub fn with_snippets(mut self, snippets: &'a [ChannelSnippet]) -> Self {
        self.channel_snippets = snippets;
        self
    }
}

/// Clip a reply to `max_chars` characters, marker included
#[must_use]
pub fn truncate_reply(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let mut clipped: String = text.chars().take(max_chars - 1).collect();
    clipped.push(TRUNCATION_MARKER);
    clipped
}

/// Produces replies for chat messages
pub struct ResponseGenerator {
    provider: Arc<dyn LlmProvider>,
    sessions: Arc<SessionStore>,
    cooldown: Arc<CooldownGate>,
    games: Arc<GameSessions>,
    context: ContextWindowBuilder,
    config: GeneratorConfig,
}

impl ResponseGenerator {
    /// Create a generator over shared stores
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        sessions: Arc<SessionStore>,
        cooldown: Arc<CooldownGate>,
        games: Arc<GameSessions>,
        config: GeneratorConfig,
    ) -> Self {
        Self {
            context: ContextWindowBuilder::new(config.context_budget_tokens),
            provider,
            sessions,
            cooldown,
            games,
            config,
        }
    }

    /// Generator configuration
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Answer a message, returning the reply or the classified failure
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn generate(&self, request: GenerateRequest<'_>) -> Result<String> {
        let user_id = request.user_id;
        let input = request.input.trim();
        if input.is_empty() {
            return Err(Error::EmptyInput);
        }

        self.cooldown
            .acquire(user_id, Utc::now())
            .map_err(|retry_after| Error::ThrottledLocally { retry_after })?;

        self.sessions.append_turn(user_id, Turn::user(input, Utc::now()));
        let session = self.sessions.get(user_id);
        let prior = &session.turns()[..session.len().saturating_sub(1)];
        let context = self.context.build(prior);

        let overlay = self.games.get(user_id).map(|game| game.overlay());
        if overlay.is_some() {
            if let Some(progress) = self.games.advance(user_id, input) {
                debug!(progress = ?progress, "Advanced game");
            }
        }

        let messages = assemble_prompt(
            request.persona,
            overlay.as_deref(),
            request.channel_snippets,
            &context,
            input,
        );
        debug!(
            context_turns = context.len(),
            message_count = messages.len(),
            "Prompt assembled"
        );

        let completion = CompletionRequest::new(self.config.model.clone())
            .with_messages(messages)
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature);

        let response = retry_with_backoff(
            &self.config.retry,
            || self.provider.complete(completion.clone()),
            |e: &parley_llm::Error| e.is_retryable(),
        )
        .await
        .map_err(|RetryError { last_error, attempts }| Error::from_upstream(last_error, attempts))?;

        let text = response.content.trim();
        if text.is_empty() {
            return Err(Error::UpstreamUnknown("empty completion".to_string()));
        }

        let reply = truncate_reply(text, self.config.max_reply_chars);
        let session_len = self
            .sessions
            .append_turn(user_id, Turn::assistant(reply.as_str(), Utc::now()));
        info!(session_len = session_len, reply_chars = reply.chars().count(), "Reply generated");

        Ok(reply)
    }

    /// Answer a message, rendering any failure as persona text
    pub async fn respond(&self, request: GenerateRequest<'_>) -> String {
        match self.generate(request).await {
            Ok(reply) => reply,
            Err(e) => {
                match &e {
                    Error::UpstreamUnknown(detail) => {
                        error!(user_id = %request.user_id, error = %detail, "Generation failed");
                    }
                    Error::UpstreamQuotaExceeded(_) | Error::UpstreamAuth(_) => {
                        error!(user_id = %request.user_id, error = %e, "Provider rejected request");
                    }
                    Error::UpstreamRateLimited { attempts } => {
                        warn!(user_id = %request.user_id, attempts = attempts, "Rate limit retries exhausted");
                    }
                    _ => debug!(user_id = %request.user_id, error = %e, "Request declined"),
                }
                format_error_for_chat(&e, request.persona)
            }
        }
    }
}

fn assemble_prompt(
    persona: &Persona,
    overlay: Option<&str>,
    snippets: &[ChannelSnippet],
    context: &[Turn],
    input: &str,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(context.len() + 3);

    let mut system = persona.system_prompt();
    if let Some(overlay) = overlay {
        system.push_str("\n\n");
        system.push_str(overlay);
    }
    messages.push(Message::system(system));

    if !snippets.is_empty() {
        let lines: Vec<String> = snippets.iter().map(ChannelSnippet::to_line).collect();
        messages.push(Message::system(format!(
            "Recent messages in this channel:\n{}",
            lines.join("\n")
        )));
    }

    messages.extend(context.iter().map(Turn::to_message));
    messages.push(Message::user(input));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UserFriendlyError;
    use async_trait::async_trait;
    use mockall::mock;
    use parley_llm::{CompletionResponse, MessageRole, MockProvider};
    use tokio::time::Instant;

    mock! {
        pub Llm {}

        #[async_trait]
        impl LlmProvider for Llm {
            fn name(&self) -> &str;
            fn default_model(&self) -> &str;
            async fn complete(&self, request: CompletionRequest) -> parley_llm::Result<CompletionResponse>;
        }
    }

    struct Harness {
        generator: ResponseGenerator,
        sessions: Arc<SessionStore>,
        games: Arc<GameSessions>,
    }

    fn harness(provider: Arc<dyn LlmProvider>, cooldown: Duration) -> Harness {
        let chat = ChatConfig::default();
        let sessions = Arc::new(SessionStore::from_config(&chat));
        let games = Arc::new(GameSessions::new());
        let generator = ResponseGenerator::new(
            provider,
            Arc::clone(&sessions),
            Arc::new(CooldownGate::new(cooldown)),
            Arc::clone(&games),
            GeneratorConfig::from_chat(&chat, "test-model"),
        );
        Harness {
            generator,
            sessions,
            games,
        }
    }

    fn rate_limited() -> parley_llm::Error {
        parley_llm::Error::RateLimit { retry_after: None }
    }

    #[test]
    fn test_truncate_reply() {
        assert_eq!(truncate_reply("hello", 5), "hello");
        assert_eq!(truncate_reply("hello world", 6), "hello…");
        assert_eq!(truncate_reply("hello", 0), "");
        let long = "é".repeat(3000);
        let clipped = truncate_reply(&long, 1900);
        assert_eq!(clipped.chars().count(), 1900);
        assert!(clipped.ends_with(TRUNCATION_MARKER));
    }

    #[tokio::test]
    async fn test_successful_exchange_records_both_turns() {
        let provider = MockProvider::new();
        provider.push_reply("Hi there!");
        let h = harness(Arc::new(provider.clone()), Duration::ZERO);
        let persona = Persona::default();

        let reply = h
            .generator
            .generate(GenerateRequest::new("alice", "  hello  ", &persona))
            .await
            .unwrap();

        assert_eq!(reply, "Hi there!");
        let session = h.sessions.get("alice");
        assert_eq!(session.len(), 2);
        assert_eq!(session.turns()[0].content, "hello");
        assert_eq!(session.turns()[1].content, "Hi there!");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_input_leaves_session_unchanged() {
        let provider = MockProvider::new();
        let h = harness(Arc::new(provider.clone()), Duration::ZERO);
        let persona = Persona::default();

        let err = h
            .generator
            .generate(GenerateRequest::new("alice", "   \n\t", &persona))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::EmptyInput));
        assert!(!h.sessions.contains("alice"));
        assert_eq!(provider.call_count(), 0);

        let text = h
            .generator
            .respond(GenerateRequest::new("alice", "", &persona))
            .await;
        assert_eq!(text, Error::EmptyInput.user_message());
    }

    #[tokio::test]
    async fn test_cooldown_rejects_second_request() {
        let provider = MockProvider::new();
        let h = harness(Arc::new(provider.clone()), Duration::from_secs(3));
        let persona = Persona::default();

        h.generator
            .generate(GenerateRequest::new("alice", "one", &persona))
            .await
            .unwrap();
        let err = h
            .generator
            .generate(GenerateRequest::new("alice", "two", &persona))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ThrottledLocally { .. }));
        assert_eq!(h.sessions.get("alice").len(), 2);
        assert_eq!(provider.call_count(), 1);

        // Other users are not affected
        h.generator
            .generate(GenerateRequest::new("bob", "hi", &persona))
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_retried_until_success() {
        let provider = MockProvider::new();
        provider.push_result(Err(rate_limited()));
        provider.push_result(Err(rate_limited()));
        provider.push_reply("finally");
        let h = harness(Arc::new(provider.clone()), Duration::ZERO);
        let persona = Persona::default();

        let start = Instant::now();
        let reply = h
            .generator
            .generate(GenerateRequest::new("alice", "hello", &persona))
            .await
            .unwrap();

        assert_eq!(reply, "finally");
        assert_eq!(provider.call_count(), 3);
        // 2000ms before retry 1, 4000ms before retry 2
        assert!(start.elapsed() >= Duration::from_millis(6000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_exhaustion() {
        let provider = MockProvider::new();
        for _ in 0..4 {
            provider.push_result(Err(rate_limited()));
        }
        let h = harness(Arc::new(provider.clone()), Duration::ZERO);
        let persona = Persona::default();

        let err = h
            .generator
            .generate(GenerateRequest::new("alice", "hello", &persona))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UpstreamRateLimited { attempts: 3 }));
        assert_eq!(provider.call_count(), 3);

        // User turn stays, no assistant turn
        let session = h.sessions.get("alice");
        assert_eq!(session.len(), 1);
        assert_eq!(session.turns()[0].content, "hello");
    }

    #[tokio::test]
    async fn test_quota_is_not_retried() {
        let mut provider = MockLlm::new();
        provider
            .expect_complete()
            .times(1)
            .returning(|_| Err(parley_llm::Error::QuotaExceeded("billing".to_string())));
        let h = harness(Arc::new(provider), Duration::ZERO);
        let persona = Persona::default();

        let err = h
            .generator
            .generate(GenerateRequest::new("alice", "hello", &persona))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UpstreamQuotaExceeded(_)));
    }

    #[tokio::test]
    async fn test_auth_failure_maps_and_renders() {
        let mut provider = MockLlm::new();
        provider
            .expect_complete()
            .times(1)
            .returning(|_| Err(parley_llm::Error::Auth("bad key".to_string())));
        let h = harness(Arc::new(provider), Duration::ZERO);
        let persona = Persona {
            auth_reply: Some("I can't reach my brain right now.".to_string()),
            ..Persona::default()
        };

        let text = h
            .generator
            .respond(GenerateRequest::new("alice", "hello", &persona))
            .await;
        assert_eq!(text, "I can't reach my brain right now.");
    }

    #[tokio::test]
    async fn test_prompt_order() {
        let provider = MockProvider::new();
        provider.push_reply("first answer");
        provider.push_reply("second answer");
        let h = harness(Arc::new(provider.clone()), Duration::ZERO);
        let persona = Persona::new("Pip", "Be brief.");

        h.generator
            .generate(GenerateRequest::new("alice", "first question", &persona))
            .await
            .unwrap();

        let snippets = vec![ChannelSnippet {
            author: "bob".to_string(),
            text: "anyone here?".to_string(),
            at: Utc::now(),
        }];
        h.generator
            .generate(
                GenerateRequest::new("alice", "second question", &persona).with_snippets(&snippets),
            )
            .await
            .unwrap();

        let request = provider.last_request().unwrap();
        assert_eq!(request.model, "test-model");
        let roles: Vec<MessageRole> = request.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::System,
                MessageRole::System,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
            ]
        );
        assert!(request.messages[0].content.contains("Pip"));
        assert!(request.messages[1].content.contains("bob: anyone here?"));
        assert_eq!(request.messages[2].content, "first question");
        assert_eq!(request.messages[3].content, "first answer");
        assert_eq!(request.messages[4].content, "second question");
    }

    #[tokio::test]
    async fn test_game_overlay_applied_and_riddle_ends() {
        let provider = MockProvider::new();
        provider.push_reply("Correct!");
        let h = harness(Arc::new(provider.clone()), Duration::ZERO);
        let persona = Persona::default();
        h.games.start(
            "alice",
            crate::game::GamePayload::Riddle {
                riddle: "What has keys?".to_string(),
                answer: "a piano".to_string(),
            },
            Utc::now(),
        );

        h.generator
            .generate(GenerateRequest::new("alice", "a piano", &persona))
            .await
            .unwrap();

        let request = provider.last_request().unwrap();
        assert!(request.messages[0].content.contains("a piano"));
        assert!(h.games.get("alice").is_none());
    }

    #[tokio::test]
    async fn test_long_reply_is_clipped_before_storing() {
        let provider = MockProvider::new();
        provider.push_reply("x".repeat(5000));
        let h = harness(Arc::new(provider), Duration::ZERO);
        let persona = Persona::default();

        let reply = h
            .generator
            .generate(GenerateRequest::new("alice", "talk a lot", &persona))
            .await
            .unwrap();

        assert_eq!(reply.chars().count(), 1900);
        assert_eq!(h.sessions.get("alice").turns()[1].content, reply);
    }
}
