//! Chat engine
//!
//! Composition root for the session engine. Owns every store, the generator
//! and the sweeper, and exposes the operations a transport needs.

use crate::config::ChatConfig;
use crate::cooldown::CooldownGate;
use crate::error::Result;
use crate::game::{GameKind, GameSessions, GameState};
use crate::generator::{GenerateRequest, GeneratorConfig, ResponseGenerator};
use crate::history::{ChannelHistory, MemoryChannelHistory};
use crate::memory::{SessionStore, Turn};
use crate::persona::Persona;
use crate::sweeper::{SweepReport, Sweeper};
use chrono::Utc;
use parley_llm::LlmProvider;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Session engine entry point
pub struct ChatEngine {
    config: ChatConfig,
    persona: Persona,
    sessions: Arc<SessionStore>,
    cooldown: Arc<CooldownGate>,
    games: Arc<GameSessions>,
    history: Arc<dyn ChannelHistory>,
    generator: ResponseGenerator,
    sweeper: Arc<Sweeper>,
}

impl ChatEngine {
    /// Build an engine with in-memory channel history
    pub fn new(
        config: ChatConfig,
        generator_config: GeneratorConfig,
        persona: Persona,
        provider: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        let history = Arc::new(MemoryChannelHistory::new(config.channel_history_limit));
        Self::with_history(config, generator_config, persona, provider, history)
    }

    /// Build an engine with a caller-supplied channel history
    pub fn with_history(
        config: ChatConfig,
        generator_config: GeneratorConfig,
        persona: Persona,
        provider: Arc<dyn LlmProvider>,
        history: Arc<dyn ChannelHistory>,
    ) -> Result<Self> {
        config.validate()?;

        let sessions = Arc::new(SessionStore::from_config(&config));
        let cooldown = Arc::new(CooldownGate::new(config.cooldown()));
        let games = Arc::new(GameSessions::new());
        let generator = ResponseGenerator::new(
            provider,
            Arc::clone(&sessions),
            Arc::clone(&cooldown),
            Arc::clone(&games),
            generator_config,
        );
        let sweeper = Arc::new(Sweeper::new(
            Arc::clone(&sessions),
            Arc::clone(&cooldown),
            Arc::clone(&games),
        ));

        info!(
            persona = %persona.name,
            max_total_sessions = config.max_total_sessions,
            cooldown_ms = config.cooldown_ms,
            "Chat engine initialized"
        );

        Ok(Self {
            config,
            persona,
            sessions,
            cooldown,
            games,
            history,
            generator,
            sweeper,
        })
    }

    /// Answer a message from `user_id` in `channel_id`
    ///
    /// Always returns text; failures are rendered in the persona's voice.
    pub async fn respond(&self, user_id: &str, channel_id: &str, input: &str) -> String {
        let snippets = if self.config.channel_snippets > 0 {
            self.history.recent(channel_id, self.config.channel_snippets).await
        } else {
            Vec::new()
        };
        let request = GenerateRequest::new(user_id, input, &self.persona).with_snippets(&snippets);
        self.generator.respond(request).await
    }

    /// Same as [`respond`](Self::respond) but returns the classified result
    pub async fn generate(&self, user_id: &str, channel_id: &str, input: &str) -> Result<String> {
        let snippets = self.history.recent(channel_id, self.config.channel_snippets).await;
        let request = GenerateRequest::new(user_id, input, &self.persona).with_snippets(&snippets);
        self.generator.generate(request).await
    }

    /// Record a message seen in a channel
    pub async fn observe(&self, channel_id: &str, author: &str, text: &str) {
        self.history.append(channel_id, author, text).await;
    }

    /// Forget everything about a user: session, cooldown and game
    pub fn clear_user(&self, user_id: &str) -> bool {
        let had_session = self.sessions.clear(user_id);
        self.cooldown.remove(user_id);
        self.games.end(user_id);
        info!(user_id = %user_id, had_session = had_session, "Cleared user state");
        had_session
    }

    /// Start a game and return its opening line
    ///
    /// The opening is recorded as an assistant turn so the game always has
    /// an owning session and the model sees what the user is answering.
    pub fn start_game(&self, user_id: &str, kind: GameKind) -> String {
        let now = Utc::now();
        let state = self.games.start_kind(user_id, kind, now);
        let opening = state.opening();
        self.sessions.append_turn(user_id, Turn::assistant(opening.clone(), now));
        info!(user_id = %user_id, game = %kind, "Game started");
        opening
    }

    /// End the user's game, returning it if one was active
    pub fn end_game(&self, user_id: &str) -> Option<GameState> {
        self.games.end(user_id)
    }

    /// Active game for a user
    #[must_use]
    pub fn active_game(&self, user_id: &str) -> Option<GameState> {
        self.games.get(user_id)
    }

    /// Number of turns stored for a user
    #[must_use]
    pub fn session_len(&self, user_id: &str) -> usize {
        self.sessions.get(user_id).len()
    }

    /// Run one sweep now
    pub fn sweep_now(&self) -> Option<SweepReport> {
        self.sweeper.run(Utc::now())
    }

    /// Start periodic sweeping until `cancel` fires
    pub fn spawn_sweeper(&self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        Arc::clone(&self.sweeper).spawn(interval, cancel)
    }

    /// Reset every per-user store
    pub fn dispose(&self) {
        self.sessions.dispose();
        self.cooldown.dispose();
        self.games.dispose();
        info!("Chat engine state disposed");
    }

    /// Chat configuration
    #[must_use]
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Active persona
    #[must_use]
    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    /// Session store
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Cooldown gate
    #[must_use]
    pub fn cooldown(&self) -> &Arc<CooldownGate> {
        &self.cooldown
    }

    /// Game registry
    #[must_use]
    pub fn games(&self) -> &Arc<GameSessions> {
        &self.games
    }
}
