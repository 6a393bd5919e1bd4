//! Bundle reader for opening and verifying export bundles.
//!
//! Reads ZIP archives with integrity verification and returns typed
//! artifacts.

use crate::manifest::{
    AUDIT_FILE_NAME, CLEAN_FILE_NAME, MANIFEST_FILE_NAME, SUMMARY_FILE_NAME,
};
use crate::{BundleError, BundleManifest, ExportProfile, FileEntry, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::{debug, info, warn};
use vl_redact::{AuditLog, CleanDocument, RedactionSummary};
use zip::ZipArchive;

/// Reader for export bundles with verification.
pub struct BundleReader<R: Read + Seek> {
    manifest: BundleManifest,
    archive: ZipArchive<R>,
    verified: HashSet<String>,
}

impl BundleReader<File> {
    /// Open a bundle from a file path.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }
}

impl BundleReader<Cursor<Vec<u8>>> {
    /// Open a bundle from bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }
}

impl<R: Read + Seek> BundleReader<R> {
    /// Create a reader from any Read + Seek source.
    ///
    /// Fails if the manifest is invalid, or if a shareable bundle carries an
    /// audit log anywhere in the archive, listed or not.
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let manifest = Self::read_manifest(&mut archive)?;
        manifest.validate()?;

        if !manifest.export_profile.allows_audit_log()
            && archive.file_names().any(|name| name == AUDIT_FILE_NAME)
        {
            warn!(profile = %manifest.export_profile, "Shareable bundle contains an audit log");
            return Err(BundleError::ProfileViolation(format!(
                "{} bundle contains {}",
                manifest.export_profile, AUDIT_FILE_NAME
            )));
        }

        info!(
            document_hash = %manifest.document_hash,
            files = manifest.file_count(),
            profile = %manifest.export_profile,
            "Bundle opened"
        );

        Ok(Self {
            manifest,
            archive,
            verified: HashSet::new(),
        })
    }

    fn read_manifest(archive: &mut ZipArchive<R>) -> Result<BundleManifest> {
        let mut manifest_file = archive
            .by_name(MANIFEST_FILE_NAME)
            .map_err(|_| BundleError::MissingFile(MANIFEST_FILE_NAME.to_string()))?;

        let mut json = String::new();
        manifest_file.read_to_string(&mut json)?;

        BundleManifest::from_json(&json)
            .map_err(|e| BundleError::CorruptedManifest(e.to_string()))
    }

    pub fn manifest(&self) -> &BundleManifest {
        &self.manifest
    }

    pub fn export_profile(&self) -> ExportProfile {
        self.manifest.export_profile
    }

    /// List all files in the bundle.
    pub fn files(&self) -> &[FileEntry] {
        &self.manifest.files
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.manifest.find_file(path).is_some()
    }

    fn read_raw(&mut self, path: &str) -> Result<Vec<u8>> {
        let mut file = self
            .archive
            .by_name(path)
            .map_err(|_| BundleError::FileNotFound(path.to_string()))?;

        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Read a file with checksum verification.
    pub fn read_verified(&mut self, path: &str) -> Result<Vec<u8>> {
        let expected = self
            .manifest
            .find_file(path)
            .ok_or_else(|| BundleError::FileNotFound(path.to_string()))?
            .sha256
            .clone();

        let data = self.read_raw(path)?;

        let actual = FileEntry::compute_checksum(&data);
        if actual != expected {
            warn!(path, "Bundle checksum mismatch");
            return Err(BundleError::ChecksumMismatch {
                path: path.to_string(),
                expected,
                actual,
            });
        }

        self.verified.insert(path.to_string());
        debug!(path, bytes = data.len(), "File verified");
        Ok(data)
    }

    pub fn is_verified(&self, path: &str) -> bool {
        self.verified.contains(path)
    }

    /// Verify all files in the bundle.
    ///
    /// Returns list of paths that failed verification.
    pub fn verify_all(&mut self) -> Vec<String> {
        let paths: Vec<String> = self.manifest.files.iter().map(|f| f.path.clone()).collect();

        let mut failures = Vec::new();
        for path in paths {
            if let Err(e) = self.read_verified(&path) {
                warn!(path = %path, error = %e, "Verification failed");
                failures.push(path);
            }
        }

        if failures.is_empty() {
            info!("All files verified");
        }
        failures
    }

    /// Read and parse a JSON file.
    pub fn read_json<T: serde::de::DeserializeOwned>(&mut self, path: &str) -> Result<T> {
        let data = self.read_verified(path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Read the clean document, paired with the hash recorded in the manifest.
    pub fn read_clean_document(&mut self) -> Result<CleanDocument> {
        let data = self.read_verified(CLEAN_FILE_NAME)?;
        let text = String::from_utf8(data).map_err(|e| {
            BundleError::CorruptedManifest(format!("{} is not UTF-8: {}", CLEAN_FILE_NAME, e))
        })?;
        Ok(CleanDocument::with_recorded_hash(
            text,
            self.manifest.clean_document_hash.clone(),
        ))
    }

    pub fn read_summary(&mut self) -> Result<RedactionSummary> {
        self.read_json(SUMMARY_FILE_NAME)
    }

    /// Read the audit log. Shareable bundles have none.
    pub fn read_audit_log(&mut self) -> Result<Option<AuditLog>> {
        if !self.has_file(AUDIT_FILE_NAME) {
            return Ok(None);
        }
        let data = self.read_verified(AUDIT_FILE_NAME)?;
        let json = String::from_utf8_lossy(&data);
        let log = AuditLog::from_json(&json)?;

        if log.document_hash != self.manifest.document_hash
            || log.clean_document_hash != self.manifest.clean_document_hash
        {
            return Err(BundleError::CorruptedManifest(
                "audit log hashes do not match the manifest".to_string(),
            ));
        }
        Ok(Some(log))
    }
}
