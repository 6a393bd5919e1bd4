//! Bundle manifest types and serialization.
//!
//! The manifest is the source of truth for a bundle's contents, providing:
//! - Bundle metadata (version, timestamp, export profile)
//! - Hashes of the original and clean documents
//! - File listing with SHA-256 checksums

use crate::{BundleError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use vl_redact::hash::is_content_hash;

/// Current bundle schema version.
pub const BUNDLE_SCHEMA_VERSION: &str = "1.0.0";

/// Manifest file name within the bundle.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Clean document file name within the bundle.
pub const CLEAN_FILE_NAME: &str = "clean.txt";

/// Redaction summary file name within the bundle.
pub const SUMMARY_FILE_NAME: &str = "summary.json";

/// Audit log file name; only present in local bundles.
pub const AUDIT_FILE_NAME: &str = "audit.json";

/// Who a bundle may be handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportProfile {
    /// Stays with the session owner; carries the audit log for restore.
    Local,
    /// Safe to hand to downstream collaborators; never carries the audit log.
    Shareable,
}

impl ExportProfile {
    /// Whether bundles with this profile may contain the audit log.
    pub fn allows_audit_log(&self) -> bool {
        matches!(self, ExportProfile::Local)
    }
}

impl std::fmt::Display for ExportProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportProfile::Local => write!(f, "local"),
            ExportProfile::Shareable => write!(f, "shareable"),
        }
    }
}

impl std::str::FromStr for ExportProfile {
    type Err = BundleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(ExportProfile::Local),
            "shareable" | "share" => Ok(ExportProfile::Shareable),
            other => Err(BundleError::InvalidProfile(other.to_string())),
        }
    }
}

/// Bundle manifest containing metadata and file checksums.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleManifest {
    /// Bundle format version.
    pub bundle_version: String,

    /// When the bundle was created.
    pub created_at: DateTime<Utc>,

    /// Export profile used (local/shareable).
    pub export_profile: ExportProfile,

    /// Content hash of the original document.
    pub document_hash: String,

    /// Content hash of `clean.txt`.
    pub clean_document_hash: String,

    /// Version of the jurisdiction ruleset applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ruleset_version: Option<String>,

    /// Files included in the bundle with checksums.
    pub files: Vec<FileEntry>,

    /// Optional description or notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// veil version that created this bundle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_version: Option<String>,
}

impl BundleManifest {
    /// Create a new manifest with required fields.
    pub fn new(
        export_profile: ExportProfile,
        document_hash: impl Into<String>,
        clean_document_hash: impl Into<String>,
    ) -> Self {
        Self {
            bundle_version: BUNDLE_SCHEMA_VERSION.to_string(),
            created_at: Utc::now(),
            export_profile,
            document_hash: document_hash.into(),
            clean_document_hash: clean_document_hash.into(),
            ruleset_version: None,
            files: Vec::new(),
            description: None,
            tool_version: None,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_ruleset_version(mut self, version: impl Into<String>) -> Self {
        self.ruleset_version = Some(version.into());
        self
    }

    pub fn with_tool_version(mut self, version: impl Into<String>) -> Self {
        self.tool_version = Some(version.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a file entry to the manifest.
    pub fn add_file(&mut self, entry: FileEntry) {
        self.files.push(entry);
    }

    /// Get total size of all files in bytes.
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.bytes).sum()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Find a file by path.
    pub fn find_file(&self, path: &str) -> Option<&FileEntry> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Validate the manifest structure.
    pub fn validate(&self) -> Result<()> {
        if self.bundle_version != BUNDLE_SCHEMA_VERSION {
            return Err(BundleError::UnsupportedVersion {
                version: self.bundle_version.clone(),
                supported: BUNDLE_SCHEMA_VERSION.to_string(),
            });
        }

        if !is_content_hash(&self.document_hash) {
            return Err(BundleError::CorruptedManifest(
                "document_hash is not a SHA-256 hex digest".to_string(),
            ));
        }

        if !is_content_hash(&self.clean_document_hash) {
            return Err(BundleError::CorruptedManifest(
                "clean_document_hash is not a SHA-256 hex digest".to_string(),
            ));
        }

        for file in &self.files {
            if file.path.is_empty() {
                return Err(BundleError::CorruptedManifest(
                    "file entry has empty path".to_string(),
                ));
            }
            if file.sha256.len() != 64 {
                return Err(BundleError::CorruptedManifest(format!(
                    "file '{}' has invalid checksum length",
                    file.path
                )));
            }
        }

        for required in [CLEAN_FILE_NAME, SUMMARY_FILE_NAME] {
            if self.find_file(required).is_none() {
                return Err(BundleError::MissingFile(required.to_string()));
            }
        }

        if !self.export_profile.allows_audit_log() && self.find_file(AUDIT_FILE_NAME).is_some() {
            return Err(BundleError::ProfileViolation(format!(
                "{} bundle lists {}",
                self.export_profile, AUDIT_FILE_NAME
            )));
        }

        Ok(())
    }

    /// Sort files for deterministic ordering.
    pub fn sort_files(&mut self) {
        self.files.sort_by(|a, b| a.path.cmp(&b.path));
    }

    /// Serialize to JSON with consistent formatting.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// File entry in the manifest with checksum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path within the bundle (relative).
    pub path: String,

    /// SHA-256 checksum (64 hex characters).
    pub sha256: String,

    /// Size in bytes.
    pub bytes: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl FileEntry {
    /// Create an entry for `data`, computing its checksum.
    pub fn for_data(path: impl Into<String>, data: &[u8]) -> Self {
        Self {
            path: path.into(),
            sha256: Self::compute_checksum(data),
            bytes: data.len() as u64,
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Compute SHA-256 checksum of data.
    pub fn compute_checksum(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    /// Verify the checksum against data.
    pub fn verify(&self, data: &[u8]) -> bool {
        Self::compute_checksum(data) == self.sha256
    }
}
