//! User settings (`settings.toml`).
//!
//! Every field has a default, so an empty file is valid. Unknown keys are
//! rejected to catch typos early.

use crate::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings file name inside a config directory.
pub const SETTINGS_FILENAME: &str = "settings.toml";

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Jurisdiction tags activated when the CLI does not pass `-j`.
    pub jurisdictions: Vec<String>,

    /// Detector ids in tie-break order (earlier wins).
    pub detector_priority: Vec<String>,

    /// Reuse one placeholder for repeated identical values.
    pub dedupe_values: bool,

    /// Drop the builtin pattern rules; only `custom_patterns` are used.
    pub disable_builtin_patterns: bool,

    /// Extra regex rules added to the pattern detector.
    pub custom_patterns: Vec<CustomPattern>,

    /// Exact-term lists for the dictionary detector.
    pub dictionary: Vec<DictionaryEntry>,
}

/// A user-defined regex rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomPattern {
    pub name: String,
    pub category: String,
    pub pattern: String,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

/// A list of exact terms sharing one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DictionaryEntry {
    pub category: String,
    pub terms: Vec<String>,
    #[serde(default)]
    pub case_insensitive: bool,
}

fn default_confidence() -> f32 {
    0.9
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn from_toml(content: &str, origin: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| ConfigError::ParseError {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load settings from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content, path)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
