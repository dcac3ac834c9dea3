//! Configuration validation.
//!
//! Checks that required values are present and consistent before the game
//! catalog is built from them.

use std::collections::HashSet;
use thiserror::Error;

use crate::config::{Config, LanguageConfig, ObservabilityConfig, SessionConfig};
use crate::logging::{LOG_FORMATS, LOG_LEVELS};

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

impl Config {
    /// Validate the entire configuration, collecting every problem found.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = self.session.validate() {
            errors.push(e);
        }

        if let Err(e) = self.observability.validate() {
            errors.push(e);
        }

        if self.languages.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "languages".into(),
            });
        }

        let mut seen = HashSet::new();
        for (idx, lang) in self.languages.iter().enumerate() {
            if !lang.id.is_empty() && !seen.insert(lang.id.as_str()) {
                errors.push(ValidationError::InvalidValue {
                    field: format!("languages[{idx}].id"),
                    reason: format!("duplicate language id '{}'", lang.id),
                });
            }
            if let Err(e) = lang.validate() {
                errors.push(e);
            }
        }

        if self.defaults.is_set() {
            if self
                .find_pack(&self.defaults.language_id, &self.defaults.pack_id)
                .is_none()
            {
                errors.push(ValidationError::InvalidValue {
                    field: "defaults.pack_id".into(),
                    reason: format!(
                        "word pack {}/{} is not configured",
                        self.defaults.language_id, self.defaults.pack_id
                    ),
                });
            }
        } else if !self.defaults.language_id.is_empty() || !self.defaults.pack_id.is_empty() {
            errors.push(ValidationError::MissingField {
                field: if self.defaults.language_id.is_empty() {
                    "defaults.language_id".into()
                } else {
                    "defaults.pack_id".into()
                },
            });
        }

        if self.definitions.peek_max_chars == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "definitions.peek_max_chars".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.definitions.reveal_max_chars == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "definitions.reveal_max_chars".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }
}

impl Validate for SessionConfig {
    fn validate(&self) -> ValidationResult<()> {
        if let Err(e) = self.idle_ttl() {
            return Err(ValidationError::InvalidValue {
                field: "session.idle_ttl".into(),
                reason: e.to_string(),
            });
        }
        match self.sweep_interval() {
            Err(e) => Err(ValidationError::InvalidValue {
                field: "session.sweep_interval".into(),
                reason: e.to_string(),
            }),
            Ok(interval) if interval.is_zero() => Err(ValidationError::InvalidValue {
                field: "session.sweep_interval".into(),
                reason: "must be greater than 0".into(),
            }),
            Ok(_) => Ok(()),
        }
    }
}

impl Validate for LanguageConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.id.is_empty() {
            return Err(ValidationError::MissingField {
                field: "languages[].id".into(),
            });
        }
        if self.word_packs.is_empty() {
            return Err(ValidationError::MissingField {
                field: format!("languages[{}].word_packs", self.id),
            });
        }

        let mut seen = HashSet::new();
        for pack in &self.word_packs {
            if pack.id.is_empty() {
                return Err(ValidationError::MissingField {
                    field: format!("languages[{}].word_packs[].id", self.id),
                });
            }
            if pack.path.is_empty() {
                return Err(ValidationError::MissingField {
                    field: format!("languages[{}].word_packs[{}].path", self.id, pack.id),
                });
            }
            if !seen.insert(pack.id.as_str()) {
                return Err(ValidationError::InvalidValue {
                    field: format!("languages[{}].word_packs[{}].id", self.id, pack.id),
                    reason: "duplicate word pack id".into(),
                });
            }
        }

        Ok(())
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!("must be one of: {}", LOG_LEVELS.join(", ")),
            });
        }

        if !LOG_FORMATS.contains(&self.log_format.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!("must be one of: {}", LOG_FORMATS.join(", ")),
            });
        }

        Ok(())
    }
}
