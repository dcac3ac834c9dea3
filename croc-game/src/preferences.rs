//! Per-chat word pack preference.
//!
//! The engine reads the preference when it creates a session and writes it
//! when a host picks a pack. Storage is up to the implementor.

use dashmap::DashMap;

use croc_common::config::DefaultsConfig;

use crate::ChatId;

/// A (language, pack) pair as stored by a preference backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackRef {
    pub language_id: String,
    pub pack_id: String,
}

impl PackRef {
    pub fn new(language_id: impl Into<String>, pack_id: impl Into<String>) -> Self {
        Self {
            language_id: language_id.into(),
            pack_id: pack_id.into(),
        }
    }

    /// The configured default pack, if both ids are set.
    pub fn from_defaults(defaults: &DefaultsConfig) -> Option<Self> {
        defaults
            .is_set()
            .then(|| Self::new(&defaults.language_id, &defaults.pack_id))
    }
}

/// Where chats remember their chosen word pack.
pub trait PreferenceStore: Send + Sync {
    /// The chat's saved pack, or the store's default, or nothing.
    fn load_preferred_pack(&self, chat_id: ChatId) -> Option<PackRef>;

    /// Remember `pack` for the chat. Failures are the store's to log.
    fn save_preferred_pack(&self, chat_id: ChatId, pack: PackRef);
}

/// Process-local preferences, lost on restart.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    default: Option<PackRef>,
    chats: DashMap<ChatId, PackRef>,
}

impl MemoryPreferences {
    pub fn new(default: Option<PackRef>) -> Self {
        Self {
            default,
            chats: DashMap::new(),
        }
    }

    /// Seed the fallback pack from the `defaults` config section.
    pub fn from_defaults(defaults: &DefaultsConfig) -> Self {
        Self::new(PackRef::from_defaults(defaults))
    }

    pub fn default_pack(&self) -> Option<&PackRef> {
        self.default.as_ref()
    }

    /// Number of chats with an explicit choice.
    pub fn len(&self) -> usize {
        self.chats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn load_preferred_pack(&self, chat_id: ChatId) -> Option<PackRef> {
        self.chats
            .get(&chat_id)
            .map(|entry| entry.value().clone())
            .or_else(|| self.default.clone())
    }

    fn save_preferred_pack(&self, chat_id: ChatId, pack: PackRef) {
        tracing::debug!(
            chat_id,
            language_id = %pack.language_id,
            pack_id = %pack.pack_id,
            "Saving preferred word pack"
        );
        self.chats.insert(chat_id, pack);
    }
}
