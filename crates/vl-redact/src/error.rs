//! Error types for the redaction engine.
//!
//! Error messages carry offsets, placeholder ids and content hashes only.
//! Original values never appear in an error.

use thiserror::Error;

/// Result type for redaction operations.
pub type Result<T> = std::result::Result<T, RedactError>;

/// Errors that can occur while scanning, redacting or restoring.
#[derive(Error, Debug)]
pub enum RedactError {
    /// A jurisdiction tag is not registered in the active ruleset.
    #[error("unknown jurisdiction: {0}")]
    UnknownJurisdiction(String),

    /// A hash check failed during restore. Treated as a potential tamper event.
    #[error("integrity mismatch on {subject}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        subject: String,
        expected: String,
        actual: String,
    },

    /// The clean document references a placeholder absent from the audit log.
    #[error("unresolved placeholder {placeholder} at byte {offset}")]
    UnresolvedPlaceholder { placeholder: String, offset: usize },

    /// The audit log violates its schema.
    #[error("malformed audit log: {0}")]
    MalformedAuditLog(String),

    /// An approved span does not fit the document it is applied to.
    #[error("invalid span: {0}")]
    InvalidSpan(String),

    /// A category name is not an uppercase identifier.
    #[error("invalid category: {0:?}")]
    InvalidCategory(String),

    /// Untouched document text already contains placeholder syntax.
    #[error("document already contains placeholder syntax at byte {offset}")]
    PlaceholderCollision { offset: usize },

    /// A detector panicked while scanning.
    #[error("detector '{0}' failed")]
    DetectorFailed(String),

    /// Failed to compile a detection pattern.
    #[error("pattern error: {0}")]
    PatternError(String),

    /// Failed to load or validate a jurisdiction ruleset.
    #[error("ruleset error: {0}")]
    RulesetError(String),

    /// Failed to load or generate seal key material.
    #[error("key error: {0}")]
    KeyError(String),

    /// I/O error during key, ruleset or audit log file operations.
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl RedactError {
    pub(crate) fn integrity(
        subject: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        RedactError::IntegrityMismatch {
            subject: subject.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Whether this error signals a tampered or mismatched artifact.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            RedactError::IntegrityMismatch { .. }
                | RedactError::UnresolvedPlaceholder { .. }
                | RedactError::MalformedAuditLog(_)
        )
    }
}
