//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;
use vl_redact::RedactError;

/// Result type for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// What kind of problem a [`ValidationIssue`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    UnknownJurisdiction,
    InvalidCategory,
    InvalidPattern,
    InvalidValue,
    Duplicate,
}

/// A single problem found while validating settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    /// Dotted path of the offending field, e.g. `custom_patterns[2].pattern`.
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(kind: IssueKind, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("invalid settings file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid ruleset file {path}: {source}")]
    Ruleset {
        path: PathBuf,
        #[source]
        source: RedactError,
    },

    #[error("settings validation failed: {}", format_issues(.0))]
    Invalid(Vec<ValidationIssue>),

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Redact(#[from] RedactError),
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ConfigError {
    /// Validation issues, if this is a validation failure.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            ConfigError::Invalid(issues) => issues,
            _ => &[],
        }
    }

    /// Whether the root cause is an unknown jurisdiction tag.
    pub fn is_unknown_jurisdiction(&self) -> bool {
        match self {
            ConfigError::Redact(RedactError::UnknownJurisdiction(_)) => true,
            ConfigError::Invalid(issues) => issues
                .iter()
                .any(|i| i.kind == IssueKind::UnknownJurisdiction),
            _ => false,
        }
    }
}
