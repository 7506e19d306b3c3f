//! Mini-game overlay
//!
//! At most one game per user. A game rides on top of normal chat: while it is
//! active, its overlay text is appended to the prompt and each follow-up user
//! turn advances its payload. Whether an answer is right is left to the model;
//! the overlay hands it the secret or answer to judge against.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Supported game types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameKind {
    /// Twenty-questions style guessing game
    Guessing,
    /// Collaborative story building
    Story,
    /// One would-you-rather question
    WouldYouRather,
    /// One riddle
    Riddle,
}

impl GameKind {
    /// All game types
    pub const ALL: [GameKind; 4] = [
        GameKind::Guessing,
        GameKind::Story,
        GameKind::WouldYouRather,
        GameKind::Riddle,
    ];

    /// Canonical name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guessing => "guessing-game",
            Self::Story => "story-building",
            Self::WouldYouRather => "would-you-rather",
            Self::Riddle => "riddle",
        }
    }

    /// Whether the game ends after a single follow-up turn
    #[must_use]
    pub fn is_single_shot(&self) -> bool {
        matches!(self, Self::WouldYouRather | Self::Riddle)
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "guessing-game" | "guessing" | "20q" => Ok(Self::Guessing),
            "story-building" | "story" => Ok(Self::Story),
            "would-you-rather" | "wyr" => Ok(Self::WouldYouRather),
            "riddle" => Ok(Self::Riddle),
            other => Err(format!(
                "unknown game '{}' (try guessing-game, story-building, would-you-rather, riddle)",
                other
            )),
        }
    }
}

/// Per-type game payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum GamePayload {
    /// Guessing game state
    Guessing {
        /// The thing the user is trying to guess
        secret: String,
        /// Follow-up turns so far
        guesses: u32,
    },
    /// Story building state
    Story {
        /// Accumulated contributions, oldest first
        story: String,
    },
    /// Pending would-you-rather question
    WouldYouRather {
        /// The question put to the user
        question: String,
    },
    /// Pending riddle
    Riddle {
        /// The riddle text
        riddle: String,
        /// Expected answer
        answer: String,
    },
}

impl GamePayload {
    /// Game type of this payload
    #[must_use]
    pub fn kind(&self) -> GameKind {
        match self {
            Self::Guessing { .. } => GameKind::Guessing,
            Self::Story { .. } => GameKind::Story,
            Self::WouldYouRather { .. } => GameKind::WouldYouRather,
            Self::Riddle { .. } => GameKind::Riddle,
        }
    }
}

const SECRETS: &[&str] = &[
    "lighthouse", "penguin", "volcano", "umbrella", "telescope", "cactus", "submarine",
    "violin", "pyramid", "octopus",
];

const WOULD_YOU_RATHER: &[&str] = &[
    "Would you rather be able to fly or be invisible?",
    "Would you rather live in the ocean or on the moon?",
    "Would you rather have a pet dragon or a pet unicorn?",
    "Would you rather always be ten minutes late or twenty minutes early?",
    "Would you rather speak every language or play every instrument?",
];

const RIDDLES: &[(&str, &str)] = &[
    ("What has keys but can't open locks?", "a piano"),
    ("What gets wetter the more it dries?", "a towel"),
    ("What has a neck but no head?", "a bottle"),
    ("What can travel around the world while staying in a corner?", "a stamp"),
    ("The more of them you take, the more you leave behind. What are they?", "footsteps"),
];

const STORY_OPENING: &str = "Once upon a time, in a town nobody could find on a map,";

/// Active game for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Owning user
    pub user_id: String,
    /// Game payload
    pub payload: GamePayload,
    /// When the game was started
    pub created_at: DateTime<Utc>,
}

impl GameState {
    /// Game type
    #[must_use]
    pub fn kind(&self) -> GameKind {
        self.payload.kind()
    }

    /// Instruction text appended to the prompt while the game is active
    #[must_use]
    pub fn overlay(&self) -> String {
        match &self.payload {
            GamePayload::Guessing { secret, guesses } => format!(
                "You are playing a guessing game with the user. The secret word is \"{}\". \
                 Answer their questions with yes or no and a short hint, never say the word \
                 unless they guess it. They have asked {} question(s) so far. If they guess \
                 correctly, congratulate them.",
                secret, guesses
            ),
            GamePayload::Story { story } => format!(
                "You are building a story together with the user. Continue it with one or two \
                 sentences that follow on from their contribution, then invite them to add \
                 more. The story so far:\n{}",
                story
            ),
            GamePayload::WouldYouRather { question } => format!(
                "You asked the user: \"{}\". React playfully to their choice and share which \
                 one you would pick.",
                question
            ),
            GamePayload::Riddle { riddle, answer } => format!(
                "You asked the user the riddle: \"{}\". The answer is \"{}\". Tell them whether \
                 they got it and reveal the answer if they did not.",
                riddle, answer
            ),
        }
    }

    /// Opening line shown to the user when the game starts
    #[must_use]
    pub fn opening(&self) -> String {
        match &self.payload {
            GamePayload::Guessing { .. } => {
                "🎯 I'm thinking of something. Ask me yes-or-no questions and try to guess it!"
                    .to_string()
            }
            GamePayload::Story { story } => {
                format!("📖 Let's write a story together. I'll start:\n{}", story)
            }
            GamePayload::WouldYouRather { question } => format!("🤔 {}", question),
            GamePayload::Riddle { riddle, .. } => format!("🧩 Riddle time! {}", riddle),
        }
    }

    fn apply(&mut self, user_turn: &str) -> GameProgress {
        match &mut self.payload {
            GamePayload::Guessing { guesses, .. } => {
                *guesses += 1;
                GameProgress::Continued
            }
            GamePayload::Story { story } => {
                let contribution = user_turn.trim();
                if !contribution.is_empty() {
                    if !story.is_empty() {
                        story.push(' ');
                    }
                    story.push_str(contribution);
                }
                GameProgress::Continued
            }
            GamePayload::WouldYouRather { .. } | GamePayload::Riddle { .. } => {
                GameProgress::Finished
            }
        }
    }
}

/// Result of advancing a game by one user turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameProgress {
    /// Game stays active
    Continued,
    /// Game ended and was removed
    Finished,
}

/// Build a fresh payload for a game type from the built-in catalogue
#[must_use]
pub fn default_payload(kind: GameKind) -> GamePayload {
    let mut rng = rand::thread_rng();
    match kind {
        GameKind::Guessing => GamePayload::Guessing {
            secret: SECRETS.choose(&mut rng).copied().unwrap_or("lighthouse").to_string(),
            guesses: 0,
        },
        GameKind::Story => GamePayload::Story {
            story: STORY_OPENING.to_string(),
        },
        GameKind::WouldYouRather => GamePayload::WouldYouRather {
            question: WOULD_YOU_RATHER
                .choose(&mut rng)
                .copied()
                .unwrap_or("Would you rather be able to fly or be invisible?")
                .to_string(),
        },
        GameKind::Riddle => {
            let (riddle, answer) = RIDDLES
                .choose(&mut rng)
                .copied()
                .unwrap_or(("What has keys but can't open locks?", "a piano"));
            GamePayload::Riddle {
                riddle: riddle.to_string(),
                answer: answer.to_string(),
            }
        }
    }
}

/// Per-user game slots
#[derive(Debug, Default)]
pub struct GameSessions {
    games: DashMap<String, GameState>,
}

impl GameSessions {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a game with an explicit payload, replacing any active one
    pub fn start(&self, user_id: &str, payload: GamePayload, now: DateTime<Utc>) -> GameState {
        let state = GameState {
            user_id: user_id.to_string(),
            payload,
            created_at: now,
        };
        if let Some(previous) = self.games.insert(user_id.to_string(), state.clone()) {
            debug!(
                user_id = %user_id,
                replaced = %previous.kind(),
                started = %state.kind(),
                "Replaced active game"
            );
        }
        state
    }

    /// Start a game of the given type with a catalogue payload
    pub fn start_kind(&self, user_id: &str, kind: GameKind, now: DateTime<Utc>) -> GameState {
        self.start(user_id, default_payload(kind), now)
    }

    /// Snapshot of the user's active game
    #[must_use]
    pub fn get(&self, user_id: &str) -> Option<GameState> {
        self.games.get(user_id).map(|g| g.clone())
    }

    /// End the user's game
    pub fn end(&self, user_id: &str) -> Option<GameState> {
        self.games.remove(user_id).map(|(_, state)| state)
    }

    /// Advance the user's game by one follow-up turn
    ///
    /// Returns `None` when no game is active. Single-shot games are removed
    /// under the same entry lock that applied the turn.
    pub fn advance(&self, user_id: &str, user_turn: &str) -> Option<GameProgress> {
        match self.games.entry(user_id.to_string()) {
            Entry::Occupied(mut entry) => {
                let progress = entry.get_mut().apply(user_turn);
                if progress == GameProgress::Finished {
                    entry.remove();
                    debug!(user_id = %user_id, "Single-shot game finished");
                }
                Some(progress)
            }
            Entry::Vacant(_) => None,
        }
    }

    /// Keep only the games whose user passes `keep`; returns how many were removed
    pub fn retain_users<F>(&self, mut keep: F) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        let before = self.games.len();
        self.games.retain(|user_id, _| keep(user_id.as_str()));
        before.saturating_sub(self.games.len())
    }

    /// Users with an active game
    #[must_use]
    pub fn users(&self) -> Vec<String> {
        self.games.iter().map(|e| e.key().clone()).collect()
    }

    /// Number of active games
    #[must_use]
    pub fn len(&self) -> usize {
        self.games.len()
    }

    /// Whether no game is active
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Drop every game
    pub fn dispose(&self) {
        self.games.clear();
    }
}
