//! Configuration for the Crocodile game.
//!
//! The configuration file lives at `~/.crocodile/config.json` unless
//! `CROC_CONFIG` points elsewhere.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (CROC_* prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `CROC_CONFIG` → path of the config file
//! - `CROC_LOG_LEVEL` → observability.log_level
//! - `CROC_LOG_FORMAT` → observability.log_format
//! - `CROC_SESSION_TTL` → session.idle_ttl

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, ResultExt};
use crate::util::parse_duration;

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".crocodile"),
        |dirs| dirs.home_dir().join(".crocodile"),
    )
}

/// Get the configuration file path, honouring `CROC_CONFIG`.
pub fn config_path() -> PathBuf {
    std::env::var_os("CROC_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| config_dir().join("config.json"))
}

// ============================================================================
// Session Configuration
// ============================================================================

/// Per-chat session cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Idle time after which a chat's session is forgotten ("30m", "24h", ...).
    /// Values below one hour are raised to one hour by the session store.
    #[serde(default = "default_idle_ttl")]
    pub idle_ttl: String,

    /// How often the background janitor sweeps expired sessions.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_ttl: default_idle_ttl(),
            sweep_interval: default_sweep_interval(),
        }
    }
}

impl SessionConfig {
    /// Parsed idle TTL, before the store applies its floor.
    pub fn idle_ttl(&self) -> Result<Duration> {
        parse_duration(&self.idle_ttl).context("session.idle_ttl")
    }

    /// Parsed janitor interval.
    pub fn sweep_interval(&self) -> Result<Duration> {
        parse_duration(&self.sweep_interval).context("session.sweep_interval")
    }
}

fn default_idle_ttl() -> String {
    "24h".into()
}

fn default_sweep_interval() -> String {
    "10m".into()
}

// ============================================================================
// Word Packs
// ============================================================================

/// Pack used for chats that never picked one.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub language_id: String,
    #[serde(default)]
    pub pack_id: String,
}

impl DefaultsConfig {
    /// Whether a default pack is configured at all.
    pub fn is_set(&self) -> bool {
        !self.language_id.is_empty() && !self.pack_id.is_empty()
    }
}

/// A language and its word packs, in menu order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub word_packs: Vec<WordPackConfig>,
}

/// A word-pack file: one word per line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordPackConfig {
    pub id: String,
    pub name: String,
    pub path: String,
    /// Part of speech used to scope dictionary lookups ("noun", "verb", ...).
    #[serde(default)]
    pub part: String,
}

impl WordPackConfig {
    /// Resolve `path`: expand `~` and make relative paths relative to `base`.
    pub fn resolved_path(&self, base: Option<&Path>) -> PathBuf {
        let expanded = PathBuf::from(shellexpand::tilde(&self.path).as_ref());
        match base {
            Some(base) if expanded.is_relative() => base.join(expanded),
            _ => expanded,
        }
    }
}

/// Text budgets for definitions shown to players.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionsConfig {
    /// Budget for the host's "peek definition" hint.
    #[serde(default = "default_peek_max_chars")]
    pub peek_max_chars: usize,

    /// Budget for the definition revealed after a round is solved.
    #[serde(default = "default_reveal_max_chars")]
    pub reveal_max_chars: usize,

    /// Optional JSON dictionary file, `{lang: {part: {word: definition}}}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl DefinitionsConfig {
    /// Resolve `path` the same way word pack paths are resolved.
    pub fn resolved_path(&self, base: Option<&Path>) -> Option<PathBuf> {
        let path = self.path.as_deref()?;
        let expanded = PathBuf::from(shellexpand::tilde(path).as_ref());
        Some(match base {
            Some(base) if expanded.is_relative() => base.join(expanded),
            _ => expanded,
        })
    }
}

impl Default for DefinitionsConfig {
    fn default() -> Self {
        Self {
            peek_max_chars: default_peek_max_chars(),
            reveal_max_chars: default_reveal_max_chars(),
            path: None,
        }
    }
}

fn default_peek_max_chars() -> usize {
    200
}

fn default_reveal_max_chars() -> usize {
    1000
}

// ============================================================================
// Observability
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

// ============================================================================
// Root
// ============================================================================

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// JSON Schema reference
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Languages in menu order
    #[serde(default)]
    pub languages: Vec<LanguageConfig>,

    #[serde(default)]
    pub definitions: DefinitionsConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Directory the file was loaded from; relative pack paths resolve against it.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default path, falling back to defaults.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config from {}", path.display()))?;

        let mut config: Self = serde_json::from_str(&content)
            .context(format!("Failed to parse config from {}", path.display()))?;
        config.base_dir = path.parent().map(Path::to_path_buf);

        tracing::debug!(
            path = %path.display(),
            languages = config.languages.len(),
            "Loaded config"
        );
        Ok(config)
    }

    /// Load configuration and apply environment overrides.
    pub fn load_with_env(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("CROC_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Ok(format) = std::env::var("CROC_LOG_FORMAT") {
            self.observability.log_format = format;
        }
        if let Ok(ttl) = std::env::var("CROC_SESSION_TTL") {
            self.session.idle_ttl = ttl;
        }
    }

    /// Find a configured word pack.
    pub fn find_pack(&self, language_id: &str, pack_id: &str) -> Option<&WordPackConfig> {
        self.languages
            .iter()
            .find(|lang| lang.id == language_id)
            .and_then(|lang| lang.word_packs.iter().find(|pack| pack.id == pack_id))
    }

    /// Total number of configured word packs.
    pub fn pack_count(&self) -> usize {
        self.languages.iter().map(|lang| lang.word_packs.len()).sum()
    }
}
