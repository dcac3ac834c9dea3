//! Word catalog: languages, their word packs, and random word selection.
//!
//! The catalog is built once at startup and shared read-only afterwards
//! (`Arc<WordCatalog>`), so lookups need no locking. Load order is kept
//! because menus list languages and packs in that order.

use rand::seq::SliceRandom;
use rand::Rng;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use croc_common::config::Config;

use crate::error::CatalogError;

/// Identity and display data for a word pack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackInfo {
    pub language_id: String,
    pub pack_id: String,
    /// Display name shown in the pack menu.
    pub name: String,
    /// Part of speech used to scope dictionary lookups; may be empty.
    pub part_of_speech: String,
}

impl PackInfo {
    pub fn new(
        language_id: impl Into<String>,
        pack_id: impl Into<String>,
        name: impl Into<String>,
        part_of_speech: impl Into<String>,
    ) -> Self {
        Self {
            language_id: language_id.into(),
            pack_id: pack_id.into(),
            name: name.into(),
            part_of_speech: part_of_speech.into(),
        }
    }
}

/// An immutable, non-empty list of candidate words.
#[derive(Debug, Clone)]
pub struct WordPack {
    info: PackInfo,
    words: Vec<String>,
}

impl WordPack {
    /// Build a pack, trimming every word and dropping blank entries.
    pub fn new<I, S>(info: PackInfo, words: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();

        if words.is_empty() {
            return Err(CatalogError::EmptyPack {
                language_id: info.language_id,
                pack_id: info.pack_id,
            });
        }

        Ok(Self { info, words })
    }

    /// Read a pack from a file holding one word per line.
    pub fn load_file(path: &Path, info: PackInfo) -> Result<Self, CatalogError> {
        let io_err = |source: std::io::Error| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        let lines = BufReader::new(file)
            .lines()
            .collect::<Result<Vec<_>, _>>()
            .map_err(io_err)?;

        Self::new(info, lines)
    }

    pub fn info(&self) -> &PackInfo {
        &self.info
    }

    pub fn language_id(&self) -> &str {
        &self.info.language_id
    }

    pub fn pack_id(&self) -> &str {
        &self.info.pack_id
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn part_of_speech(&self) -> &str {
        &self.info.part_of_speech
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Always false; packs cannot be built empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Pick a word uniformly at random. Repeats across calls are allowed.
    pub fn pick_word(&self) -> &str {
        self.pick_word_with(&mut rand::thread_rng())
    }

    /// Pick a word with a caller-supplied random source.
    pub fn pick_word_with<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        self.words.choose(rng).map(String::as_str).unwrap_or_default()
    }
}

/// A language with its packs in load order.
#[derive(Debug, Clone)]
struct Language {
    id: String,
    name: String,
    packs: Vec<Arc<WordPack>>,
}

/// Registry of languages → word packs.
#[derive(Debug, Clone, Default)]
pub struct WordCatalog {
    languages: Vec<Language>,
}

impl WordCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the catalog from configuration.
    ///
    /// Packs that fail to load are logged and skipped; the build only fails
    /// when nothing could be loaded at all.
    pub fn from_config(config: &Config) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        let base = config.base_dir.as_deref();

        for lang in &config.languages {
            for pack in &lang.word_packs {
                let info = PackInfo::new(&lang.id, &pack.id, &pack.name, &pack.part);
                let path = pack.resolved_path(base);
                let loaded = WordPack::load_file(&path, info)
                    .and_then(|wp| catalog.insert(&lang.name, wp));

                match loaded {
                    Ok(()) => tracing::debug!(
                        language_id = %lang.id,
                        pack_id = %pack.id,
                        path = %path.display(),
                        "Loaded word pack"
                    ),
                    Err(e) => tracing::warn!(
                        language_id = %lang.id,
                        pack_id = %pack.id,
                        error = %e,
                        "Error loading word pack, skipping"
                    ),
                }
            }
        }

        if catalog.is_empty() {
            return Err(CatalogError::NoPacksLoaded);
        }

        tracing::info!(
            languages = catalog.languages.len(),
            packs = catalog.pack_count(),
            "Word catalog ready"
        );
        Ok(catalog)
    }

    /// Register a pack from a word list.
    pub fn load_pack<I, S>(
        &mut self,
        language_name: &str,
        info: PackInfo,
        words: I,
    ) -> Result<(), CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pack = WordPack::new(info, words)?;
        self.insert(language_name, pack)
    }

    /// Register a built pack. The language name is taken from its first pack.
    pub fn insert(&mut self, language_name: &str, pack: WordPack) -> Result<(), CatalogError> {
        let idx = match self.language_index(pack.language_id()) {
            Some(idx) => idx,
            None => {
                self.languages.push(Language {
                    id: pack.language_id().to_string(),
                    name: language_name.to_string(),
                    packs: Vec::new(),
                });
                self.languages.len() - 1
            }
        };

        let language = &mut self.languages[idx];
        if language.packs.iter().any(|p| p.pack_id() == pack.pack_id()) {
            return Err(CatalogError::DuplicatePack {
                language_id: pack.info.language_id,
                pack_id: pack.info.pack_id,
            });
        }

        language.packs.push(Arc::new(pack));
        Ok(())
    }

    fn language_index(&self, language_id: &str) -> Option<usize> {
        self.languages.iter().position(|l| l.id == language_id)
    }

    fn language(&self, language_id: &str) -> Option<&Language> {
        self.languages.iter().find(|l| l.id == language_id)
    }

    /// Look up a pack. Unknown ids are a normal `None`.
    pub fn pack(&self, language_id: &str, pack_id: &str) -> Option<Arc<WordPack>> {
        self.language(language_id)?
            .packs
            .iter()
            .find(|p| p.pack_id() == pack_id)
            .cloned()
    }

    /// Language ids in load order.
    pub fn language_ids(&self) -> Vec<&str> {
        self.languages.iter().map(|l| l.id.as_str()).collect()
    }

    /// Pack ids of a language in load order.
    pub fn pack_ids(&self, language_id: &str) -> Option<Vec<&str>> {
        self.language(language_id)
            .map(|l| l.packs.iter().map(|p| p.pack_id()).collect())
    }

    pub fn language_name(&self, language_id: &str) -> Option<&str> {
        self.language(language_id).map(|l| l.name.as_str())
    }

    pub fn pack_name(&self, language_id: &str, pack_id: &str) -> Option<&str> {
        self.language(language_id)?
            .packs
            .iter()
            .find(|p| p.pack_id() == pack_id)
            .map(|p| p.name())
    }

    pub fn pack_count(&self) -> usize {
        self.languages.iter().map(|l| l.packs.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}
