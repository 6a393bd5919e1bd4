//! Veil configuration loading and validation.
//!
//! This crate provides:
//! - Typed settings for `settings.toml`
//! - Ruleset file loading (`rulesets.json`), falling back to the builtin table
//! - Config resolution (CLI → env → XDG → defaults)
//! - Semantic validation that reports every problem at once

pub mod error;
pub mod loader;
pub mod resolve;
pub mod settings;
pub mod validate;

pub use error::{ConfigError, IssueKind, Result, ValidationIssue};
pub use loader::{load_config, load_from_paths, LoadedConfig};
pub use resolve::{resolve_config, resolve_config_with, ConfigOptions, ConfigPaths, ConfigSource};
pub use settings::{CustomPattern, DictionaryEntry, Settings, SETTINGS_FILENAME};
pub use validate::validate_settings;
