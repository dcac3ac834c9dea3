//! Definition lookup collaborator.
//!
//! The engine only needs `find(language, part of speech, word)`. Real
//! dictionaries live outside this crate; `MemoryDictionary` covers tests and
//! the local console game.

use serde_json::Value;
use std::collections::HashMap;

/// Read-only definition source keyed by (language, part of speech, word).
pub trait DefinitionLookup: Send + Sync {
    /// Definition text for `word`, or `None` when the dictionary has none.
    fn find(&self, language_id: &str, part_of_speech: &str, word: &str) -> Option<String>;
}

/// A dictionary that knows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDefinitions;

impl DefinitionLookup for NoDefinitions {
    fn find(&self, _language_id: &str, _part_of_speech: &str, _word: &str) -> Option<String> {
        None
    }
}

/// In-memory dictionary.
///
/// Lookups try the exact title first and fall back to a case-insensitive match.
/// When several titles differ only by case, the fallback picks the smallest.
#[derive(Debug, Clone, Default)]
pub struct MemoryDictionary {
    entries: HashMap<(String, String), HashMap<String, String>>,
}

impl MemoryDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a definition. Blank definitions are ignored.
    pub fn insert(
        &mut self,
        language_id: impl Into<String>,
        part_of_speech: impl Into<String>,
        word: impl Into<String>,
        definition: impl Into<String>,
    ) {
        let definition = definition.into().trim().to_string();
        if definition.is_empty() {
            return;
        }
        self.entries
            .entry((language_id.into(), part_of_speech.into()))
            .or_default()
            .insert(word.into(), definition);
    }

    /// Builder-style `insert`.
    pub fn with_entry(
        mut self,
        language_id: &str,
        part_of_speech: &str,
        word: &str,
        definition: &str,
    ) -> Self {
        self.insert(language_id, part_of_speech, word, definition);
        self
    }

    /// Build from `{ "<lang>": { "<part>": { "<word>": "<definition>" } } }`.
    ///
    /// Entries whose value is not a string are skipped.
    pub fn from_json(value: &Value) -> Self {
        let mut dict = Self::new();
        let Some(langs) = value.as_object() else {
            return dict;
        };

        for (lang, parts) in langs {
            let Some(parts) = parts.as_object() else {
                continue;
            };
            for (part, words) in parts {
                let Some(words) = words.as_object() else {
                    continue;
                };
                for (word, text) in words {
                    if let Some(text) = text.as_str() {
                        dict.insert(lang.as_str(), part.as_str(), word.as_str(), text);
                    }
                }
            }
        }

        dict
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DefinitionLookup for MemoryDictionary {
    fn find(&self, language_id: &str, part_of_speech: &str, word: &str) -> Option<String> {
        let words = self
            .entries
            .get(&(language_id.to_string(), part_of_speech.to_string()))?;

        if let Some(text) = words.get(word) {
            return Some(text.clone());
        }

        let lowered = word.to_lowercase();
        words
            .iter()
            .filter(|(title, _)| title.to_lowercase() == lowered)
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, text)| text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_definitions() {
        assert!(NoDefinitions.find("en", "noun", "apple").is_none());
    }

    #[test]
    fn test_exact_then_case_insensitive() {
        let dict = MemoryDictionary::new()
            .with_entry("en", "noun", "Polish", "the language")
            .with_entry("en", "noun", "apple", "a fruit");

        assert_eq!(dict.find("en", "noun", "apple").as_deref(), Some("a fruit"));
        assert_eq!(dict.find("en", "noun", "APPLE").as_deref(), Some("a fruit"));
        assert_eq!(dict.find("en", "noun", "Polish").as_deref(), Some("the language"));
        assert!(dict.find("en", "verb", "apple").is_none());
        assert!(dict.find("ru", "noun", "apple").is_none());
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn test_case_insensitive_fallback_is_stable() {
        let mut entries = vec![
            ("polish", "to make shiny"),
            ("Polish", "the language"),
            ("POLISH", "shouted"),
        ];

        // Each dictionary gets its own hasher seed, so iteration order varies.
        for round in 0..16 {
            let len = entries.len();
            entries.rotate_left(round % len);
            let mut dict = MemoryDictionary::new();
            for (title, text) in &entries {
                dict.insert("en", "noun", *title, *text);
            }

            assert_eq!(dict.find("en", "noun", "Polish").as_deref(), Some("the language"));
            assert_eq!(dict.find("en", "noun", "polish").as_deref(), Some("to make shiny"));
            assert_eq!(dict.find("en", "noun", "pOlIsH").as_deref(), Some("shouted"));
        }
    }

    #[test]
    fn test_blank_definitions_ignored() {
        let dict = MemoryDictionary::new().with_entry("en", "noun", "void", "   ");
        assert!(dict.is_empty());
        assert!(dict.find("en", "noun", "void").is_none());
    }

    #[test]
    fn test_from_json() {
        let dict = MemoryDictionary::from_json(&json!({
            "en": {
                "noun": { "apple": " a fruit ", "bad": 3 },
                "verb": "not an object"
            },
            "ru": { "": { "кот": "животное" } }
        }));

        assert_eq!(dict.len(), 2);
        assert_eq!(dict.find("en", "noun", "apple").as_deref(), Some("a fruit"));
        assert_eq!(dict.find("ru", "", "Кот").as_deref(), Some("животное"));
        assert!(MemoryDictionary::from_json(&json!([1, 2])).is_empty());
    }
}
