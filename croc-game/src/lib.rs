//! Crocodile game session engine.
//!
//! One player (the host) gets a secret word and explains it; everyone else in
//! the chat guesses. This crate holds the per-chat game state and the rules:
//!
//! - [`catalog`]: languages, word packs, random word selection
//! - [`session`]: per-chat sessions with sliding expiration
//! - [`engine`]: round state machine and guess adjudication
//! - [`text`]: guess normalization and definition truncation
//! - [`dictionary`] / [`preferences`]: collaborator traits with in-memory impls
//!
//! Message transport and menus are left to the caller.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod catalog;
pub mod dictionary;
pub mod engine;
pub mod error;
pub mod preferences;
pub mod session;
pub mod text;

/// Opaque chat identifier.
pub type ChatId = i64;

/// Opaque participant identifier.
pub type ParticipantId = i64;

pub use catalog::{PackInfo, WordCatalog, WordPack};
pub use dictionary::{DefinitionLookup, MemoryDictionary, NoDefinitions};
pub use engine::{DefinitionBudgets, EngineStats, GameEngine, NewWord, SolvedRound};
pub use error::{CatalogError, GameError, GameResult};
pub use preferences::{MemoryPreferences, PackRef, PreferenceStore};
pub use session::{ActiveRound, Session, SessionHandle, SessionStore, MIN_SESSION_TTL, MIN_SWEEP_INTERVAL};
pub use text::{guess_matches, normalize_guess, truncate_definition};
