//! Error types for bundle operations.

use thiserror::Error;

/// Errors that can occur during bundle operations.
#[derive(Error, Debug)]
pub enum BundleError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Audit log or document error from the redaction engine
    #[error(transparent)]
    Redact(#[from] vl_redact::RedactError),

    /// Checksum verification failed
    #[error("checksum mismatch for '{path}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// Missing required file in bundle
    #[error("missing required file: {0}")]
    MissingFile(String),

    /// Unknown or unsupported bundle version
    #[error("unsupported bundle version: {version} (supported: {supported})")]
    UnsupportedVersion { version: String, supported: String },

    /// Corrupted manifest
    #[error("corrupted manifest: {0}")]
    CorruptedManifest(String),

    /// File not found in bundle
    #[error("file not found in bundle: {0}")]
    FileNotFound(String),

    /// Invalid export profile
    #[error("invalid export profile: {0}")]
    InvalidProfile(String),

    /// Content not permitted by the bundle's export profile
    #[error("export profile violation: {0}")]
    ProfileViolation(String),
}

/// Result type alias for bundle operations.
pub type Result<T> = std::result::Result<T, BundleError>;
