//! Croc Common - Shared configuration, errors, and logging for the Crocodile word game.
//!
//! This crate provides:
//! - Configuration types and loading (`config.json` + `CROC_*` overrides)
//! - Configuration validation
//! - Error types and context helpers
//! - Logging setup
//! - Duration parsing and formatting

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;
pub mod util;
pub mod validation;

pub use config::{
    Config, DefaultsConfig, DefinitionsConfig, LanguageConfig, ObservabilityConfig,
    SessionConfig, WordPackConfig,
};
pub use error::{Error, Result, ResultExt};
pub use validation::{Validate, ValidationError, ValidationResult};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::config::{Config, LanguageConfig, SessionConfig, WordPackConfig};
    pub use crate::error::{Error, Result, ResultExt};
    pub use crate::logging::init_logging;
    pub use crate::validation::{Validate, ValidationError};
}
