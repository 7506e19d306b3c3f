//! Integration tests for Parley
//!
//! These tests drive the engine end to end across crates:
//! - parley-llm: scripted provider and failure classes
//! - parley-core: sessions, cooldown, games, sweeping
//! - parley-channels: text commands

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use parley_channels::{execute_command, ChatCommand};
use parley_core::{ChatConfig, ChatEngine, Error, GameKind, GeneratorConfig, Persona, Turn};
use parley_llm::{Error as LlmError, MessageRole, MockProvider};
use tokio_util::sync::CancellationToken;

fn engine_with(config: ChatConfig, provider: &MockProvider) -> ChatEngine {
    let generator = GeneratorConfig::from_chat(&config, "integration-model");
    ChatEngine::new(config, generator, Persona::default(), Arc::new(provider.clone())).unwrap()
}

fn no_cooldown() -> ChatConfig {
    ChatConfig {
        cooldown_ms: 0,
        ..ChatConfig::default()
    }
}

// ============================================================================
// Exchanges
// ============================================================================

#[tokio::test]
async fn test_conversation_builds_context() {
    let provider = MockProvider::new();
    provider.push_reply("Nice to meet you, Sam!");
    provider.push_reply("Your name is Sam.");
    let engine = engine_with(no_cooldown(), &provider);

    engine.respond("sam", "general", "Hi, I'm Sam").await;
    let reply = engine.respond("sam", "general", "What's my name?").await;

    assert_eq!(reply, "Your name is Sam.");
    assert_eq!(engine.session_len("sam"), 4);

    let request = provider.last_request().unwrap();
    let user_turns: Vec<&str> = request
        .messages
        .iter()
        .filter(|m| m.role == MessageRole::User)
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(user_turns, vec!["Hi, I'm Sam", "What's my name?"]);
}

#[tokio::test]
async fn test_sessions_are_isolated_per_user() {
    let provider = MockProvider::new();
    let engine = engine_with(no_cooldown(), &provider);

    engine.respond("alice", "general", "secret plan").await;
    engine.respond("bob", "general", "hello").await;

    let request = provider.last_request().unwrap();
    assert!(!request.messages.iter().any(|m| m.content == "secret plan"));
}

#[tokio::test]
async fn test_session_cap_after_many_exchanges() {
    let provider = MockProvider::new();
    let engine = engine_with(no_cooldown(), &provider);

    for i in 0..151 {
        engine.respond("alice", "general", &format!("message {}", i)).await;
    }

    assert_eq!(engine.session_len("alice"), 300);
    let session = engine.sessions().get("alice");
    assert_eq!(session.turns()[0].content, "message 1");
}

#[tokio::test]
async fn test_cooldown_reply_is_canned() {
    let provider = MockProvider::new();
    let engine = engine_with(ChatConfig::default(), &provider);

    engine.respond("alice", "general", "one").await;
    let reply = engine.respond("alice", "general", "two").await;

    assert!(reply.contains("slow down"));
    assert_eq!(provider.call_count(), 1);
    assert_eq!(engine.session_len("alice"), 2);
}

#[tokio::test]
async fn test_empty_input_reply_is_canned() {
    let provider = MockProvider::new();
    let engine = engine_with(no_cooldown(), &provider);

    let reply = engine.respond("alice", "general", "   ").await;
    assert!(reply.contains("didn't say anything"));
    assert_eq!(engine.session_len("alice"), 0);
    assert_eq!(provider.call_count(), 0);
}

// ============================================================================
// Upstream failures
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_rate_limit_exhaustion_surfaces_message() {
    let provider = MockProvider::new();
    for _ in 0..4 {
        provider.push_result(Err(LlmError::RateLimit { retry_after: None }));
    }
    let engine = engine_with(no_cooldown(), &provider);

    let err = engine.generate("alice", "general", "hello").await.unwrap_err();
    assert!(matches!(err, Error::UpstreamRateLimited { attempts: 3 }));
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn test_quota_failure_not_retried() {
    let provider = MockProvider::new();
    provider.push_result(Err(LlmError::QuotaExceeded("insufficient_quota".to_string())));
    provider.push_reply("should not be used");
    let engine = engine_with(no_cooldown(), &provider);

    let reply = engine.respond("alice", "general", "hello").await;
    assert!(!reply.is_empty());
    assert_ne!(reply, "should not be used");
    assert_eq!(provider.call_count(), 1);
}

// ============================================================================
// Games
// ============================================================================

#[tokio::test]
async fn test_riddle_ends_after_follow_up() {
    let provider = MockProvider::new();
    let engine = engine_with(no_cooldown(), &provider);

    let opening = execute_command(&engine, "alice", ChatCommand::Game(GameKind::Riddle));
    assert!(!opening.is_empty());
    assert!(engine.active_game("alice").is_some());

    engine.respond("alice", "general", "is it a towel?").await;
    assert!(engine.active_game("alice").is_none());
}

#[tokio::test]
async fn test_story_game_persists_until_ended() {
    let provider = MockProvider::new();
    let engine = engine_with(no_cooldown(), &provider);

    engine.start_game("alice", GameKind::Story);
    engine.respond("alice", "general", "A dragon appeared.").await;
    engine.respond("alice", "general", "It was hungry.").await;

    let overlay = engine.active_game("alice").unwrap().overlay();
    assert!(overlay.contains("A dragon appeared. It was hungry."));

    execute_command(&engine, "alice", ChatCommand::EndGame);
    assert!(engine.active_game("alice").is_none());
}

// ============================================================================
// Sweeping
// ============================================================================

#[tokio::test]
async fn test_sweep_removes_idle_users_everywhere() {
    let provider = MockProvider::new();
    let engine = engine_with(ChatConfig::default(), &provider);

    let long_ago = Utc::now() - ChronoDuration::hours(3);
    engine.sessions().append_turn("idle", Turn::user("old news", long_ago));
    engine.cooldown().acquire("idle", long_ago).unwrap();
    engine.games().start_kind("idle", GameKind::Guessing, long_ago);

    engine.respond("active", "general", "hello").await;

    let report = engine.sweep_now().unwrap();
    assert_eq!(report.sessions.expired, 1);
    assert!(!engine.sessions().contains("idle"));
    assert!(engine.cooldown().last_accepted("idle").is_none());
    assert!(engine.active_game("idle").is_none());
    assert_eq!(engine.session_len("active"), 2);
}

#[tokio::test]
async fn test_capacity_sweep_keeps_most_recent() {
    let provider = MockProvider::new();
    let config = ChatConfig {
        max_total_sessions: 2,
        ..no_cooldown()
    };
    let engine = engine_with(config, &provider);

    let now = Utc::now();
    for (i, user) in ["a", "b", "c", "d"].iter().enumerate() {
        let at = now - ChronoDuration::minutes(10 - i as i64);
        engine.sessions().append_turn(user, Turn::user("hi", at));
    }

    engine.sweep_now().unwrap();
    assert_eq!(engine.sessions().len(), 2);
    assert!(engine.sessions().contains("c"));
    assert!(engine.sessions().contains("d"));
}

#[tokio::test]
async fn test_background_sweeper_cancels_cleanly() {
    let provider = MockProvider::new();
    let engine = engine_with(no_cooldown(), &provider);
    let cancel = CancellationToken::new();

    let handle = engine.spawn_sweeper(Duration::from_millis(10), cancel.clone());
    engine.respond("alice", "general", "hello").await;
    tokio::time::sleep(Duration::from_millis(30)).await;
    cancel.cancel();
    handle.await.unwrap();

    // Fresh session survives periodic sweeps
    assert_eq!(engine.session_len("alice"), 2);
}

// ============================================================================
// Commands
// ============================================================================

#[test]
fn test_reset_command_forgets_everything() {
    let provider = MockProvider::new();
    let engine = engine_with(no_cooldown(), &provider);

    tokio_test::block_on(engine.respond("alice", "general", "remember me"));
    engine.start_game("alice", GameKind::WouldYouRather);

    let reply = match ChatCommand::parse("/reset") {
        Some(Ok(command)) => execute_command(&engine, "alice", command),
        other => panic!("unexpected parse: {:?}", other),
    };

    assert!(!reply.is_empty());
    assert_eq!(engine.session_len("alice"), 0);
    assert!(engine.active_game("alice").is_none());
    assert!(engine.cooldown().last_accepted("alice").is_none());
}
