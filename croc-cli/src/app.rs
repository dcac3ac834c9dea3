//! Engine assembly from configuration.

use anyhow::{Context, Result};
use std::sync::Arc;

use croc_common::Config;
use croc_game::{
    DefinitionBudgets, DefinitionLookup, GameEngine, MemoryDictionary, MemoryPreferences,
    NoDefinitions, SessionStore, WordCatalog,
};

/// Build the catalog, dictionary, preferences and session store.
pub fn build_engine(config: &Config) -> Result<Arc<GameEngine>> {
    let catalog = WordCatalog::from_config(config).context("Failed to load word packs")?;
    let ttl = config.session.idle_ttl()?;
    let dictionary = load_dictionary(config)?;
    let preferences = Arc::new(MemoryPreferences::from_defaults(&config.defaults));

    let engine = GameEngine::new(
        Arc::new(catalog),
        Arc::new(SessionStore::new(ttl)),
        dictionary,
        preferences,
    )
    .with_budgets(DefinitionBudgets::from(&config.definitions));

    Ok(Arc::new(engine))
}

/// Load the optional JSON dictionary named by `definitions.path`.
pub fn load_dictionary(config: &Config) -> Result<Arc<dyn DefinitionLookup>> {
    let Some(path) = config
        .definitions
        .resolved_path(config.base_dir.as_deref())
    else {
        tracing::debug!("No dictionary configured");
        return Ok(Arc::new(NoDefinitions));
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read dictionary from {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse dictionary from {}", path.display()))?;

    let dictionary = MemoryDictionary::from_json(&value);
    tracing::info!(
        path = %path.display(),
        entries = dictionary.len(),
        "Dictionary loaded"
    );
    Ok(Arc::new(dictionary))
}
