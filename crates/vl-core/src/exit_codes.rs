//! Exit codes for the veil CLI.
//!
//! Exit codes communicate operation outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0-1: Operational outcomes (parse outcome from code, not output)
//! - 10-19: User/configuration errors (recoverable by user action)
//! - 20-29: Integrity failures (artifacts were altered or do not belong together)
//! - 30-39: Internal and I/O errors

use vl_bundle::BundleError;
use vl_config::ConfigError;
use vl_redact::RedactError;

/// Exit codes for veil operations.
///
/// These codes are a stable contract for automation. Changes require
/// a major version bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // ========================================================================
    // Operational Outcomes (0-1)
    // ========================================================================
    /// Success: nothing needs review
    Clean = 0,

    /// Findings need human review (flag-only spans or leaked values)
    Flagged = 1,

    // ========================================================================
    // User / Configuration Errors (10-19)
    // ========================================================================
    /// Invalid arguments
    ArgsError = 10,

    /// Settings, ruleset, pattern or key file problem
    ConfigError = 11,

    /// Jurisdiction tag not in the active ruleset
    UnknownJurisdiction = 12,

    /// Approved plan does not fit the document
    InvalidPlan = 13,

    // ========================================================================
    // Integrity Failures (20-29)
    // ========================================================================
    /// Hash, seal or checksum mismatch
    IntegrityError = 20,

    /// Clean document references a placeholder the audit log lacks
    UnresolvedPlaceholder = 21,

    /// Audit log violates its schema
    MalformedAuditLog = 22,

    // ========================================================================
    // Internal Errors (30-39)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 30,

    /// I/O error
    IoError = 31,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates an operational outcome (codes 0-1).
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    /// Check if this exit code is a user/configuration error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    /// Check if this exit code reports a failed integrity check (codes 20-29).
    pub fn is_integrity_failure(self) -> bool {
        (20..30).contains(&(self as i32))
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::Flagged => "OK_FLAGGED",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::UnknownJurisdiction => "ERR_UNKNOWN_JURISDICTION",
            ExitCode::InvalidPlan => "ERR_INVALID_PLAN",
            ExitCode::IntegrityError => "ERR_INTEGRITY",
            ExitCode::UnresolvedPlaceholder => "ERR_UNRESOLVED_PLACEHOLDER",
            ExitCode::MalformedAuditLog => "ERR_MALFORMED_AUDIT_LOG",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

impl From<&RedactError> for ExitCode {
    fn from(err: &RedactError) -> Self {
        match err {
            RedactError::UnknownJurisdiction(_) => ExitCode::UnknownJurisdiction,
            RedactError::IntegrityMismatch { .. } => ExitCode::IntegrityError,
            RedactError::UnresolvedPlaceholder { .. } => ExitCode::UnresolvedPlaceholder,
            RedactError::MalformedAuditLog(_) => ExitCode::MalformedAuditLog,
            RedactError::InvalidSpan(_) | RedactError::PlaceholderCollision { .. } => {
                ExitCode::InvalidPlan
            }
            RedactError::InvalidCategory(_)
            | RedactError::PatternError(_)
            | RedactError::RulesetError(_)
            | RedactError::KeyError(_) => ExitCode::ConfigError,
            RedactError::IoError(_) => ExitCode::IoError,
            RedactError::DetectorFailed(_) | RedactError::JsonError(_) => ExitCode::InternalError,
        }
    }
}

impl From<&ConfigError> for ExitCode {
    fn from(err: &ConfigError) -> Self {
        if err.is_unknown_jurisdiction() {
            return ExitCode::UnknownJurisdiction;
        }
        match err {
            ConfigError::Redact(inner) => ExitCode::from(inner),
            _ => ExitCode::ConfigError,
        }
    }
}

impl From<&BundleError> for ExitCode {
    fn from(err: &BundleError) -> Self {
        match err {
            BundleError::Redact(inner) => ExitCode::from(inner),
            BundleError::ChecksumMismatch { .. }
            | BundleError::CorruptedManifest(_)
            | BundleError::MissingFile(_)
            | BundleError::FileNotFound(_)
            | BundleError::ProfileViolation(_)
            | BundleError::UnsupportedVersion { .. }
            | BundleError::Zip(_) => ExitCode::IntegrityError,
            BundleError::Io(_) => ExitCode::IoError,
            BundleError::InvalidProfile(_) => ExitCode::ArgsError,
            BundleError::Json(_) => ExitCode::InternalError,
        }
    }
}
