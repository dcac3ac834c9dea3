//! Integration tests for the game engine.
//!
//! Covers the round scenarios, sliding expiration and racing callers.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;

use croc_game::{
    DefinitionLookup, GameEngine, GameError, MemoryDictionary, MemoryPreferences, PackInfo,
    PackRef, PreferenceStore, SessionStore, WordCatalog,
};

const HOUR: Duration = Duration::from_secs(60 * 60);

/// Test helper: an engine with a two-word English pack as the default.
fn create_engine(ttl: Duration) -> GameEngine {
    let dict = MemoryDictionary::new()
        .with_entry("en", "noun", "apple", "The round fruit of a tree of the rose family.")
        .with_entry("en", "noun", "Crocodile", "A large predatory reptile.");

    create_engine_with(
        ttl,
        Arc::new(dict),
        Arc::new(MemoryPreferences::new(Some(PackRef::new("en", "fruit")))),
    )
}

/// Same packs as [`create_engine`] with the given collaborators.
fn create_engine_with(
    ttl: Duration,
    dictionary: Arc<dyn DefinitionLookup>,
    preferences: Arc<dyn PreferenceStore>,
) -> GameEngine {
    let mut catalog = WordCatalog::new();
    catalog
        .load_pack(
            "English",
            PackInfo::new("en", "fruit", "Fruit", "noun"),
            ["apple", "mango"],
        )
        .unwrap();
    catalog
        .load_pack(
            "English",
            PackInfo::new("en", "animals", "Animals", "noun"),
            ["crocodile"],
        )
        .unwrap();
    catalog
        .load_pack("Русский", PackInfo::new("ru", "easy", "Лёгкие", "noun"), ["ёжик"])
        .unwrap();

    GameEngine::new(
        Arc::new(catalog),
        Arc::new(SessionStore::new(ttl)),
        dictionary,
        preferences,
    )
}

fn assert_definition_implies_word(engine: &GameEngine, chat_id: i64, host: i64) {
    if engine.peek_definition(chat_id, host).is_ok() {
        assert!(engine.peek_word(chat_id, host).is_ok());
        assert!(engine.is_active(chat_id));
    }
}

#[test]
fn test_fruit_round() {
    let engine = create_engine(HOUR);
    let pack: HashSet<&str> = ["apple", "mango"].into();

    let first = engine.play(1, 1).unwrap();
    assert!(pack.contains(first.word.as_str()));
    assert_eq!(first.has_definition, first.word == "apple");
    assert!(engine.is_active(1));

    let skipped = engine.skip_word(1, 1).unwrap();
    assert!(pack.contains(skipped.word.as_str()));
    assert!(engine.is_active(1));

    let secret = engine.peek_word(1, 1).unwrap();
    let guess = format!("  {}!!", secret.to_uppercase());
    let solved = engine.check_guess(1, 2, &guess).unwrap();

    assert_eq!(solved.word, secret);
    assert_eq!(solved.has_definition(), secret == "apple");
    assert!(!engine.is_active(1));
    assert_eq!(engine.peek_word(1, 1), Err(GameError::NoActiveRound));
}

#[test]
fn test_play_while_active_changes_nothing() {
    let engine = create_engine(HOUR);
    engine.play(1, 1).unwrap();
    let word = engine.peek_word(1, 1).unwrap();

    assert_eq!(engine.play(1, 2), Err(GameError::AlreadyActive));
    assert_eq!(engine.play(1, 1), Err(GameError::AlreadyActive));
    assert_eq!(engine.peek_word(1, 1).unwrap(), word);
    assert_eq!(engine.peek_word(1, 2), Err(GameError::NotHost { participant_id: 2 }));
}

#[test]
fn test_stop_is_idempotent() {
    let engine = create_engine(HOUR);
    assert_eq!(engine.stop(1, 1), Ok(()));

    engine.play(1, 1).unwrap();
    assert_eq!(engine.stop(1, 1), Ok(()));
    assert!(!engine.is_active(1));
    assert_eq!(engine.stop(1, 1), Ok(()));
    assert!(!engine.is_active(1));

    // the last host is remembered but a non-host stop of an idle chat is fine
    assert_eq!(engine.stop(1, 2), Ok(()));
}

#[test]
fn test_host_guess_never_matches() {
    let engine = create_engine(HOUR);
    engine.play(1, 1).unwrap();
    let word = engine.peek_word(1, 1).unwrap();

    for text in [word.clone(), word.to_uppercase(), format!("{word}!")] {
        assert!(engine.check_guess(1, 1, &text).is_none());
    }
    assert!(engine.is_active(1));
}

#[test]
fn test_guess_bound_and_trim() {
    let engine = create_engine(HOUR);
    engine.set_word_pack(1, 1, "en", "animals").unwrap();
    engine.play(1, 1).unwrap();

    // 19 chars against a 9 char word
    assert!(engine.check_guess(1, 2, "crocodile!!!!!!!!!!").is_none());
    assert!(engine.check_guess(1, 2, "a crocodile").is_none());
    assert!(engine.is_active(1));

    let solved = engine.check_guess(1, 2, "Crocodile?").unwrap();
    assert_eq!(solved.word, "crocodile");
    assert!(solved.has_definition(), "case-insensitive dictionary fallback");
}

#[test]
fn test_set_word_pack_by_non_host_is_rejected() {
    let engine = create_engine(HOUR);
    engine.play(1, 1).unwrap();
    let before = engine.peek_word(1, 1).unwrap();

    assert_eq!(
        engine.set_word_pack(1, 2, "en", "animals"),
        Err(GameError::NotHost { participant_id: 2 })
    );
    assert_eq!(engine.peek_word(1, 1).unwrap(), before);

    // pack is unchanged: the next round still draws fruit
    engine.stop(1, 1).unwrap();
    let next = engine.play(1, 1).unwrap();
    assert!(["apple", "mango"].contains(&next.word.as_str()));
}

#[test]
fn test_set_word_pack_saves_preference() {
    let prefs = Arc::new(MemoryPreferences::new(None));
    let mut catalog = WordCatalog::new();
    catalog
        .load_pack("English", PackInfo::new("en", "fruit", "Fruit", ""), ["apple"])
        .unwrap();
    let engine = GameEngine::new(
        Arc::new(catalog),
        Arc::new(SessionStore::new(HOUR)),
        Arc::new(MemoryDictionary::new()),
        prefs.clone(),
    );

    assert_eq!(engine.play(5, 1), Err(GameError::NoWordPack));
    assert!(engine.play(5, 1).unwrap_err().needs_pack_selection());

    assert_eq!(engine.set_word_pack(5, 1, "en", "fruit"), Ok(None));
    assert_eq!(prefs.load_preferred_pack(5), Some(PackRef::new("en", "fruit")));
    assert_eq!(engine.play(5, 1).unwrap().word, "apple");
}

#[test]
fn test_racing_pack_choices_match_saved_preference() {
    let prefs = Arc::new(MemoryPreferences::new(Some(PackRef::new("en", "fruit"))));
    let engine = create_engine_with(HOUR, Arc::new(MemoryDictionary::new()), prefs.clone());
    let choices = [("en", "fruit"), ("en", "animals"), ("ru", "easy")];

    for _ in 0..50 {
        let barrier = Barrier::new(choices.len() * 2);
        std::thread::scope(|s| {
            for (player, (language_id, pack_id)) in choices.iter().cycle().take(6).enumerate() {
                let (engine, barrier) = (&engine, &barrier);
                s.spawn(move || {
                    barrier.wait();
                    engine
                        .set_word_pack(1, player as i64, language_id, pack_id)
                        .unwrap();
                });
            }
        });

        // the next round draws from the session's pack
        let word = engine.play(1, 1).unwrap().word;
        let saved = prefs.load_preferred_pack(1).unwrap();
        let expected = match (saved.language_id.as_str(), saved.pack_id.as_str()) {
            ("en", "fruit") => vec!["apple", "mango"],
            ("en", "animals") => vec!["crocodile"],
            _ => vec!["ёжик"],
        };
        assert!(expected.contains(&word.as_str()), "{word} not in {saved:?}");
        engine.stop(1, 1).unwrap();
    }
}

/// Definition source that counts lookups.
#[derive(Default)]
struct CountingDictionary {
    calls: AtomicUsize,
}

impl CountingDictionary {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DefinitionLookup for CountingDictionary {
    fn find(&self, _language_id: &str, _part_of_speech: &str, word: &str) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Some(format!("definition of {word}"))
    }
}

#[test]
fn test_one_lookup_per_drawn_word() {
    let dict = Arc::new(CountingDictionary::default());
    let engine = create_engine_with(
        HOUR,
        dict.clone(),
        Arc::new(MemoryPreferences::new(Some(PackRef::new("en", "fruit")))),
    );

    // idle pack change draws nothing
    engine.set_word_pack(1, 1, "en", "animals").unwrap();
    assert_eq!(dict.calls(), 0);

    engine.play(1, 1).unwrap();
    assert_eq!(dict.calls(), 1);

    assert_eq!(engine.play(1, 2), Err(GameError::AlreadyActive));
    assert_eq!(engine.next_host(1, 2), Err(GameError::AlreadyActive));
    assert_eq!(engine.skip_word(1, 2), Err(GameError::NotHost { participant_id: 2 }));
    assert_eq!(
        engine.set_word_pack(1, 2, "en", "fruit"),
        Err(GameError::NotHost { participant_id: 2 })
    );
    assert_eq!(dict.calls(), 1);

    engine.skip_word(1, 1).unwrap();
    assert_eq!(dict.calls(), 2);

    // host re-roll on pack change
    assert!(engine.set_word_pack(1, 1, "en", "fruit").unwrap().is_some());
    assert_eq!(dict.calls(), 3);

    let word = engine.peek_word(1, 1).unwrap();
    let solved = engine.check_guess(1, 2, &word).unwrap();
    assert!(engine.reveal_definition(&solved).is_some());
    assert!(engine.peek_definition(1, 1).is_err());
    assert_eq!(dict.calls(), 3);

    engine.next_host(1, 2).unwrap();
    assert_eq!(dict.calls(), 4);
}

#[test]
fn test_chats_are_independent() {
    let engine = create_engine(HOUR);
    engine.set_word_pack(2, 7, "ru", "easy").unwrap();

    engine.play(1, 1).unwrap();
    assert_eq!(engine.play(2, 7).unwrap().word, "ёжик");

    assert!(engine.check_guess(1, 2, "ёжик").is_none());
    assert!(engine.check_guess(2, 8, "ЁЖИК").is_some());
    assert!(engine.is_active(1));
    assert_eq!(engine.list_active_conversations(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn test_ttl_floor_and_recreate() {
    let engine = create_engine(Duration::from_secs(60));
    assert_eq!(engine.store().ttl(), HOUR);

    engine.set_word_pack(1, 1, "en", "animals").unwrap();
    engine.play(1, 1).unwrap();
    assert_eq!(engine.list_active_conversations(), vec![1]);

    tokio::time::advance(Duration::from_secs(61 * 60)).await;

    assert!(!engine.is_active(1));
    assert!(engine.list_active_conversations().is_empty());
    assert_eq!(engine.peek_word(1, 1), Err(GameError::NoActiveRound));

    // recreated from the stored preference, not the old session
    let word = engine.play(1, 3).unwrap();
    assert_eq!(word.word, "crocodile");
    assert_eq!(engine.peek_word(1, 3).unwrap(), "crocodile");
}

#[tokio::test(start_paused = true)]
async fn test_activity_keeps_session_alive() {
    let engine = create_engine(HOUR);
    engine.play(1, 1).unwrap();

    for _ in 0..3 {
        tokio::time::advance(Duration::from_secs(40 * 60)).await;
        engine.skip_word(1, 1).unwrap();
    }

    assert!(engine.is_active(1));
    assert_eq!(engine.store().sweep_expired(), 0);
}

#[test]
fn test_racing_next_host_has_one_winner() {
    let engine = create_engine(HOUR);
    engine.play(1, 1).unwrap();
    let word = engine.peek_word(1, 1).unwrap();
    engine.check_guess(1, 2, &word).unwrap();

    let winners = AtomicUsize::new(0);
    let barrier = Barrier::new(16);

    std::thread::scope(|s| {
        for player in 100..116 {
            let (engine, winners, barrier) = (&engine, &winners, &barrier);
            s.spawn(move || {
                barrier.wait();
                match engine.next_host(1, player) {
                    Ok(_) => {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(err) => assert_eq!(err, GameError::AlreadyActive),
                }
            });
        }
    });

    assert_eq!(winners.load(Ordering::SeqCst), 1);
    assert!(engine.is_active(1));
}

#[test]
fn test_racing_guessers_have_one_winner() {
    let engine = create_engine(HOUR);
    engine.play(1, 1).unwrap();
    let word = engine.peek_word(1, 1).unwrap();

    let winners = AtomicUsize::new(0);
    std::thread::scope(|s| {
        for player in 2..18 {
            let (engine, winners, word) = (&engine, &winners, &word);
            s.spawn(move || {
                if engine.check_guess(1, player, word).is_some() {
                    winners.fetch_add(1, Ordering::SeqCst);
                }
            });
        }
    });

    assert_eq!(winners.load(Ordering::SeqCst), 1);
    assert_eq!(engine.stats().words_guessed, 1);
}

#[test]
fn test_many_chats_in_parallel() {
    let engine = create_engine(HOUR);

    std::thread::scope(|s| {
        for chat in 0..32 {
            let engine = &engine;
            s.spawn(move || {
                engine.play(chat, chat).unwrap();
                let word = engine.peek_word(chat, chat).unwrap();
                if chat % 2 == 0 {
                    engine.check_guess(chat, chat + 1000, &word).unwrap();
                }
            });
        }
    });

    let active = engine.list_active_conversations();
    assert_eq!(active, (0..32).filter(|c| c % 2 == 1).collect::<Vec<_>>());
}

#[derive(Debug, Clone)]
enum Op {
    Play(i64),
    Stop(i64),
    NextHost(i64),
    Skip(i64),
    Guess(i64, bool),
    SetPack(i64, bool),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let player = 1i64..4;
    prop_oneof![
        player.clone().prop_map(Op::Play),
        player.clone().prop_map(Op::Stop),
        player.clone().prop_map(Op::NextHost),
        player.clone().prop_map(Op::Skip),
        (player.clone(), any::<bool>()).prop_map(|(p, hit)| Op::Guess(p, hit)),
        (player, any::<bool>()).prop_map(|(p, fruit)| Op::SetPack(p, fruit)),
    ]
}

proptest! {
    #[test]
    fn prop_definition_implies_word(ops in proptest::collection::vec(op_strategy(), 1..40)) {
        let engine = create_engine(HOUR);

        for op in ops {
            let host = (1..4).find(|&p| engine.peek_word(1, p).is_ok());
            match op {
                Op::Play(p) => {
                    let was_active = engine.is_active(1);
                    let result = engine.play(1, p);
                    prop_assert_eq!(was_active, result == Err(GameError::AlreadyActive));
                }
                Op::Stop(p) => {
                    let _ = engine.stop(1, p);
                }
                Op::NextHost(p) => {
                    let _ = engine.next_host(1, p);
                }
                Op::Skip(p) => {
                    let _ = engine.skip_word(1, p);
                }
                Op::Guess(p, hit) => {
                    let text = match (hit, host) {
                        (true, Some(h)) => engine.peek_word(1, h).unwrap_or_default(),
                        _ => "nothing".to_string(),
                    };
                    let solved = engine.check_guess(1, p, &text);
                    if host == Some(p) {
                        prop_assert!(solved.is_none());
                    }
                }
                Op::SetPack(p, fruit) => {
                    let pack = if fruit { "fruit" } else { "animals" };
                    let _ = engine.set_word_pack(1, p, "en", pack);
                }
            }

            for p in 1..4 {
                assert_definition_implies_word(&engine, 1, p);
            }
            let hosts = (1..4).filter(|&p| engine.peek_word(1, p).is_ok()).count();
            prop_assert!(hosts <= 1);
            prop_assert_eq!(hosts == 1, engine.is_active(1));
        }
    }
}
