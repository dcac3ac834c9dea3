//! The game engine: round state machine and guess adjudication.
//!
//! Each call resolves the chat's session through the [`SessionStore`], locks it
//! once, and does the whole read-decide-write step under that lock. Store
//! methods are never called while a session guard is alive. A pack choice is
//! saved to the [`PreferenceStore`] under the guard so the saved preference
//! and the session's pack cannot disagree.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use croc_common::config::DefinitionsConfig;

use crate::catalog::{WordCatalog, WordPack};
use crate::dictionary::DefinitionLookup;
use crate::error::{GameError, GameResult};
use crate::preferences::{PackRef, PreferenceStore};
use crate::session::{ActiveRound, Session, SessionHandle, SessionStore};
use crate::text::{guess_matches, truncate_definition};
use crate::{ChatId, ParticipantId};

/// A freshly drawn secret word, as shown to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWord {
    pub word: String,
    pub has_definition: bool,
}

impl From<&ActiveRound> for NewWord {
    fn from(round: &ActiveRound) -> Self {
        Self {
            word: round.word.clone(),
            has_definition: round.definition.is_some(),
        }
    }
}

/// A round that was just won.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolvedRound {
    pub word: String,
    /// Host that explained the word.
    pub host_id: ParticipantId,
    pub definition: Option<String>,
    pub language_id: String,
    pub part_of_speech: String,
}

impl SolvedRound {
    pub fn has_definition(&self) -> bool {
        self.definition.is_some()
    }
}

/// Snapshot of engine activity counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStats {
    pub rounds_started: u64,
    pub words_skipped: u64,
    pub guesses_checked: u64,
    pub words_guessed: u64,
    pub active_rounds: usize,
    pub stored_sessions: usize,
    pub uptime: Duration,
}

#[derive(Debug, Default)]
struct Counters {
    rounds_started: AtomicU64,
    words_skipped: AtomicU64,
    guesses_checked: AtomicU64,
    words_guessed: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Character budgets for definition text handed to presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefinitionBudgets {
    pub peek_max_chars: usize,
    pub reveal_max_chars: usize,
}

impl Default for DefinitionBudgets {
    fn default() -> Self {
        Self::from(&DefinitionsConfig::default())
    }
}

impl From<&DefinitionsConfig> for DefinitionBudgets {
    fn from(config: &DefinitionsConfig) -> Self {
        Self {
            peek_max_chars: config.peek_max_chars,
            reveal_max_chars: config.reveal_max_chars,
        }
    }
}

/// Game operations for every chat.
pub struct GameEngine {
    catalog: Arc<WordCatalog>,
    store: Arc<SessionStore>,
    dictionary: Arc<dyn DefinitionLookup>,
    preferences: Arc<dyn PreferenceStore>,
    budgets: DefinitionBudgets,
    counters: Counters,
    started_at: Instant,
}

impl GameEngine {
    pub fn new(
        catalog: Arc<WordCatalog>,
        store: Arc<SessionStore>,
        dictionary: Arc<dyn DefinitionLookup>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        Self {
            catalog,
            store,
            dictionary,
            preferences,
            budgets: DefinitionBudgets::default(),
            counters: Counters::default(),
            started_at: Instant::now(),
        }
    }

    pub fn with_budgets(mut self, budgets: DefinitionBudgets) -> Self {
        self.budgets = budgets;
        self
    }

    pub fn catalog(&self) -> &WordCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    // ========================================================================
    // Round control
    // ========================================================================

    /// Start a round with `requester` as host.
    pub fn play(&self, chat_id: ChatId, requester: ParticipantId) -> GameResult<NewWord> {
        let handle = self.session_or_default(chat_id);
        let mut session = handle.lock();

        if session.is_active() {
            return Err(GameError::AlreadyActive);
        }
        let pack = session.pack().cloned().ok_or(GameError::NoWordPack)?;

        let round = self.draw_round(chat_id, &pack);
        let word = NewWord::from(&round);
        session.start_round(requester, round);
        Counters::bump(&self.counters.rounds_started);

        tracing::info!(
            chat_id,
            host_id = requester,
            language_id = pack.language_id(),
            pack_id = pack.pack_id(),
            "Round started"
        );
        Ok(word)
    }

    /// Hand the next round to `new_host`, typically the last winner.
    pub fn next_host(&self, chat_id: ChatId, new_host: ParticipantId) -> GameResult<NewWord> {
        let handle = self.session_or_default(chat_id);
        let mut session = handle.lock();

        if session.is_active() {
            return Err(GameError::AlreadyActive);
        }
        let pack = session.pack().cloned().ok_or(GameError::NoWordPack)?;

        let round = self.draw_round(chat_id, &pack);
        let word = NewWord::from(&round);
        let previous = session.host();
        session.start_round(new_host, round);
        Counters::bump(&self.counters.rounds_started);

        tracing::info!(chat_id, host_id = new_host, previous_host = ?previous, "Host changed");
        Ok(word)
    }

    /// End the round. Succeeds when nothing is running.
    pub fn stop(&self, chat_id: ChatId, requester: ParticipantId) -> GameResult<()> {
        let Some(handle) = self.store.try_get(chat_id) else {
            return Ok(());
        };

        {
            let mut session = handle.lock();
            if !session.is_active() {
                return Ok(());
            }
            if !session.is_host(requester) {
                return Err(GameError::NotHost {
                    participant_id: requester,
                });
            }
            session.end_round();
        }

        self.store.touch(chat_id);
        tracing::info!(chat_id, host_id = requester, "Round stopped");
        Ok(())
    }

    /// Replace the host's word with a new one from the same pack.
    pub fn skip_word(&self, chat_id: ChatId, requester: ParticipantId) -> GameResult<NewWord> {
        let handle = self.store.try_get(chat_id).ok_or(GameError::NoActiveRound)?;

        let word = {
            let mut session = handle.lock();
            if !session.is_active() {
                return Err(GameError::NoActiveRound);
            }
            if !session.is_host(requester) {
                return Err(GameError::NotHost {
                    participant_id: requester,
                });
            }
            let pack = session.pack().cloned().ok_or(GameError::NoWordPack)?;

            let round = self.draw_round(chat_id, &pack);
            let word = NewWord::from(&round);
            session.replace_round(round);
            word
        };

        self.store.touch(chat_id);
        Counters::bump(&self.counters.words_skipped);
        tracing::debug!(chat_id, host_id = requester, "Word skipped");
        Ok(word)
    }

    /// Switch the chat's word pack and remember the choice.
    ///
    /// During a round only the host may switch, and the word is re-drawn from
    /// the new pack. Returns the new word in that case.
    pub fn set_word_pack(
        &self,
        chat_id: ChatId,
        requester: ParticipantId,
        language_id: &str,
        pack_id: &str,
    ) -> GameResult<Option<NewWord>> {
        let pack = self
            .catalog
            .pack(language_id, pack_id)
            .ok_or_else(|| GameError::UnknownPack {
                language_id: language_id.to_string(),
                pack_id: pack_id.to_string(),
            })?;

        let handle = self.session_or_default(chat_id);
        let rerolled = {
            let mut session = handle.lock();
            if session.is_active() && !session.is_host(requester) {
                return Err(GameError::NotHost {
                    participant_id: requester,
                });
            }

            session.set_pack(Arc::clone(&pack));
            self.preferences
                .save_preferred_pack(chat_id, PackRef::new(language_id, pack_id));
            if session.is_active() {
                let round = self.draw_round(chat_id, &pack);
                let word = NewWord::from(&round);
                session.replace_round(round);
                Some(word)
            } else {
                None
            }
        };

        tracing::info!(
            chat_id,
            participant_id = requester,
            language_id,
            pack_id,
            rerolled = rerolled.is_some(),
            "Word pack selected"
        );
        Ok(rerolled)
    }

    // ========================================================================
    // Host views
    // ========================================================================

    /// The secret word, for the host only.
    pub fn peek_word(&self, chat_id: ChatId, requester: ParticipantId) -> GameResult<String> {
        let handle = self.store.try_get(chat_id).ok_or(GameError::NoActiveRound)?;
        let session = handle.lock();
        let round = Self::host_round(&session, requester)?;
        Ok(round.word.clone())
    }

    /// The full cached definition, for the host only.
    pub fn peek_definition(&self, chat_id: ChatId, requester: ParticipantId) -> GameResult<String> {
        let handle = self.store.try_get(chat_id).ok_or(GameError::NoActiveRound)?;
        let session = handle.lock();
        let round = Self::host_round(&session, requester)?;
        round.definition.clone().ok_or(GameError::NoDefinition)
    }

    /// [`peek_definition`](Self::peek_definition) cut to the hint budget.
    pub fn peek_definition_text(
        &self,
        chat_id: ChatId,
        requester: ParticipantId,
    ) -> GameResult<String> {
        let text = self.peek_definition(chat_id, requester)?;
        Ok(truncate_definition(&text, self.budgets.peek_max_chars))
    }

    fn host_round(session: &Session, requester: ParticipantId) -> GameResult<&ActiveRound> {
        let round = session.round().ok_or(GameError::NoActiveRound)?;
        if !session.is_host(requester) {
            return Err(GameError::NotHost {
                participant_id: requester,
            });
        }
        Ok(round)
    }

    // ========================================================================
    // Guessing
    // ========================================================================

    /// Adjudicate a chat message as a guess.
    ///
    /// Returns the solved round on a hit; the round is then over and the
    /// winner may claim the next round through [`next_host`](Self::next_host).
    /// The host's own messages never count.
    pub fn check_guess(
        &self,
        chat_id: ChatId,
        guesser: ParticipantId,
        text: &str,
    ) -> Option<SolvedRound> {
        let handle = self.store.try_get(chat_id)?;

        let solved = {
            let mut session = handle.lock();
            let word = session.current_word()?;
            if session.is_host(guesser) {
                return None;
            }

            Counters::bump(&self.counters.guesses_checked);
            if !guess_matches(word, text) {
                return None;
            }

            let host_id = session.host()?;
            let (language_id, part_of_speech) = session
                .pack()
                .map(|p| (p.language_id().to_string(), p.part_of_speech().to_string()))
                .unwrap_or_default();
            let round = session.end_round()?;

            SolvedRound {
                word: round.word,
                host_id,
                definition: round.definition,
                language_id,
                part_of_speech,
            }
        };

        self.store.touch(chat_id);
        Counters::bump(&self.counters.words_guessed);
        tracing::info!(chat_id, winner_id = guesser, host_id = solved.host_id, "Word guessed");
        Some(solved)
    }

    /// The solved word's definition cut to the reveal budget.
    pub fn reveal_definition(&self, solved: &SolvedRound) -> Option<String> {
        solved
            .definition
            .as_deref()
            .map(|text| truncate_definition(text, self.budgets.reveal_max_chars))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Whether a round is running. Never creates a session.
    pub fn is_active(&self, chat_id: ChatId) -> bool {
        self.store
            .try_get(chat_id)
            .is_some_and(|handle| handle.lock().is_active())
    }

    /// Chats with a running round, for the shutdown notice.
    pub fn list_active_conversations(&self) -> Vec<ChatId> {
        self.store.list_active()
    }

    pub fn stats(&self) -> EngineStats {
        let c = &self.counters;
        EngineStats {
            rounds_started: c.rounds_started.load(Ordering::Relaxed),
            words_skipped: c.words_skipped.load(Ordering::Relaxed),
            guesses_checked: c.guesses_checked.load(Ordering::Relaxed),
            words_guessed: c.words_guessed.load(Ordering::Relaxed),
            active_rounds: self.store.list_active().len(),
            stored_sessions: self.store.len(),
            uptime: self.started_at.elapsed(),
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn session_or_default(&self, chat_id: ChatId) -> SessionHandle {
        self.store
            .get_or_create(chat_id, || Session::new(self.preferred_pack(chat_id)))
    }

    fn preferred_pack(&self, chat_id: ChatId) -> Option<Arc<WordPack>> {
        let preferred = self.preferences.load_preferred_pack(chat_id)?;
        let pack = self.catalog.pack(&preferred.language_id, &preferred.pack_id);
        if pack.is_none() {
            tracing::warn!(
                chat_id,
                language_id = %preferred.language_id,
                pack_id = %preferred.pack_id,
                "Preferred word pack is not in the catalog"
            );
        }
        pack
    }

    /// One word pick and one dictionary lookup.
    fn draw_round(&self, chat_id: ChatId, pack: &WordPack) -> ActiveRound {
        let word = pack.pick_word().to_string();
        let definition = self
            .dictionary
            .find(pack.language_id(), pack.part_of_speech(), &word);

        if definition.is_none() {
            tracing::debug!(
                chat_id,
                language_id = pack.language_id(),
                part_of_speech = pack.part_of_speech(),
                "No definition for drawn word"
            );
        }

        ActiveRound { word, definition }
    }
}

impl std::fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameEngine")
            .field("store", &self.store)
            .field("budgets", &self.budgets)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PackInfo;
    use crate::dictionary::MemoryDictionary;
    use crate::preferences::MemoryPreferences;

    const HOUR: Duration = Duration::from_secs(60 * 60);

    fn engine_with(dict: MemoryDictionary, default: Option<PackRef>) -> GameEngine {
        let mut catalog = WordCatalog::new();
        catalog
            .load_pack("English", PackInfo::new("en", "one", "One", "noun"), ["apple"])
            .unwrap();
        catalog
            .load_pack("English", PackInfo::new("en", "other", "Other", "noun"), ["mango"])
            .unwrap();

        GameEngine::new(
            Arc::new(catalog),
            Arc::new(SessionStore::new(HOUR)),
            Arc::new(dict),
            Arc::new(MemoryPreferences::new(default)),
        )
    }

    fn engine() -> GameEngine {
        engine_with(MemoryDictionary::new(), Some(PackRef::new("en", "one")))
    }

    #[test]
    fn test_play_requires_pack() {
        let engine = engine_with(MemoryDictionary::new(), None);
        assert_eq!(engine.play(1, 10), Err(GameError::NoWordPack));
        assert!(!engine.is_active(1));

        // broken default behaves like no default
        let engine = engine_with(MemoryDictionary::new(), Some(PackRef::new("xx", "yy")));
        assert_eq!(engine.play(1, 10), Err(GameError::NoWordPack));
    }

    #[test]
    fn test_play_with_definition() {
        let dict = MemoryDictionary::new().with_entry("en", "noun", "apple", "A round fruit.");
        let engine = engine_with(dict, Some(PackRef::new("en", "one")));

        let word = engine.play(1, 10).unwrap();
        assert_eq!(
            word,
            NewWord {
                word: "apple".into(),
                has_definition: true,
            }
        );
        assert_eq!(engine.peek_definition(1, 10).unwrap(), "A round fruit.");
        assert_eq!(engine.peek_definition(1, 11), Err(GameError::NotHost { participant_id: 11 }));
    }

    #[test]
    fn test_peek_without_definition() {
        let engine = engine();
        engine.play(1, 10).unwrap();
        assert_eq!(engine.peek_word(1, 10).unwrap(), "apple");
        assert_eq!(engine.peek_definition(1, 10), Err(GameError::NoDefinition));
        assert_eq!(engine.peek_word(2, 10), Err(GameError::NoActiveRound));
    }

    #[test]
    fn test_peek_definition_text_is_truncated() {
        let long = "word ".repeat(100);
        let dict = MemoryDictionary::new().with_entry("en", "noun", "apple", &long);
        let engine = engine_with(dict, Some(PackRef::new("en", "one"))).with_budgets(
            DefinitionBudgets {
                peek_max_chars: 20,
                reveal_max_chars: 50,
            },
        );

        engine.play(1, 10).unwrap();
        let hint = engine.peek_definition_text(1, 10).unwrap();
        assert!(hint.chars().count() <= 20);
        assert!(hint.ends_with('…'));

        let solved = engine.check_guess(1, 20, "apple").unwrap();
        let reveal = engine.reveal_definition(&solved).unwrap();
        assert!(reveal.chars().count() <= 50);
    }

    #[test]
    fn test_set_word_pack_rerolls_for_host() {
        let engine = engine();
        engine.play(1, 10).unwrap();

        let rerolled = engine.set_word_pack(1, 10, "en", "other").unwrap();
        assert_eq!(rerolled.map(|w| w.word).as_deref(), Some("mango"));
        assert_eq!(engine.peek_word(1, 10).unwrap(), "mango");
    }

    #[test]
    fn test_set_word_pack_when_idle_is_remembered() {
        let engine = engine();
        assert_eq!(engine.set_word_pack(1, 99, "en", "other"), Ok(None));
        assert_eq!(engine.play(1, 10).unwrap().word, "mango");

        assert_eq!(
            engine.set_word_pack(1, 10, "en", "missing"),
            Err(GameError::UnknownPack {
                language_id: "en".into(),
                pack_id: "missing".into(),
            })
        );
    }

    #[test]
    fn test_skip_and_stop_need_host() {
        let engine = engine();
        assert_eq!(engine.skip_word(1, 10), Err(GameError::NoActiveRound));

        engine.play(1, 10).unwrap();
        assert_eq!(engine.skip_word(1, 11), Err(GameError::NotHost { participant_id: 11 }));
        assert_eq!(engine.skip_word(1, 10).unwrap().word, "apple");

        assert_eq!(engine.stop(1, 11), Err(GameError::NotHost { participant_id: 11 }));
        assert!(engine.is_active(1));
        assert_eq!(engine.stop(1, 10), Ok(()));
        assert!(!engine.is_active(1));
    }

    #[test]
    fn test_next_host_after_guess() {
        let engine = engine();
        engine.play(1, 10).unwrap();

        let solved = engine.check_guess(1, 20, "Apple!").unwrap();
        assert_eq!(solved.host_id, 10);
        assert_eq!(solved.language_id, "en");
        assert_eq!(solved.part_of_speech, "noun");
        assert!(!solved.has_definition());
        assert!(engine.reveal_definition(&solved).is_none());

        assert_eq!(engine.next_host(1, 20).unwrap().word, "apple");
        assert_eq!(engine.next_host(1, 30), Err(GameError::AlreadyActive));
        assert_eq!(engine.peek_word(1, 20).unwrap(), "apple");
    }

    #[test]
    fn test_stats() {
        let engine = engine();
        engine.play(1, 10).unwrap();
        engine.skip_word(1, 10).unwrap();
        assert!(engine.check_guess(1, 10, "apple").is_none());
        assert!(engine.check_guess(1, 20, "pear").is_none());
        assert!(engine.check_guess(1, 20, "apple").is_some());
        assert!(engine.check_guess(2, 20, "apple").is_none());

        let stats = engine.stats();
        assert_eq!(stats.rounds_started, 1);
        assert_eq!(stats.words_skipped, 1);
        assert_eq!(stats.guesses_checked, 2);
        assert_eq!(stats.words_guessed, 1);
        assert_eq!(stats.active_rounds, 0);
        assert_eq!(stats.stored_sessions, 1);
    }
}
