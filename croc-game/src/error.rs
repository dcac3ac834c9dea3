//! Error types for the game engine and word catalog.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for engine operations.
pub type GameResult<T> = Result<T, GameError>;

/// Why an engine operation did not go through.
///
/// None of these are faults: each one tells the caller which message to show
/// (or which setup flow to start) instead of the happy-path reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// A round is already running in this chat.
    #[error("a round is already running")]
    AlreadyActive,

    /// There is no running round in this chat.
    #[error("no round is running")]
    NoActiveRound,

    /// The caller is not the current host.
    #[error("participant {participant_id} is not the current host")]
    NotHost { participant_id: i64 },

    /// The chat has no word pack; the caller should offer pack selection.
    #[error("no word pack is selected for this chat")]
    NoWordPack,

    /// The requested pack is not in the catalog.
    #[error("word pack {language_id}/{pack_id} does not exist")]
    UnknownPack {
        language_id: String,
        pack_id: String,
    },

    /// The current word has no definition to peek at.
    #[error("no definition is available for the current word")]
    NoDefinition,
}

impl GameError {
    /// Errors that should send the user to the word-pack menu.
    pub const fn needs_pack_selection(&self) -> bool {
        matches!(self, Self::NoWordPack | Self::UnknownPack { .. })
    }
}

/// Problems building the word catalog at startup.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("word pack {language_id}/{pack_id} has no words")]
    EmptyPack {
        language_id: String,
        pack_id: String,
    },

    #[error("word pack {language_id}/{pack_id} is already loaded")]
    DuplicatePack {
        language_id: String,
        pack_id: String,
    },

    #[error("failed to read word pack {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no word packs loaded")]
    NoPacksLoaded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_pack_selection() {
        assert!(GameError::NoWordPack.needs_pack_selection());
        assert!(GameError::UnknownPack {
            language_id: "en".into(),
            pack_id: "x".into(),
        }
        .needs_pack_selection());
        assert!(!GameError::AlreadyActive.needs_pack_selection());
        assert!(!GameError::NotHost { participant_id: 7 }.needs_pack_selection());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            GameError::NotHost { participant_id: 7 }.to_string(),
            "participant 7 is not the current host"
        );
        assert_eq!(
            CatalogError::EmptyPack {
                language_id: "en".into(),
                pack_id: "easy".into(),
            }
            .to_string(),
            "word pack en/easy has no words"
        );
    }
}
