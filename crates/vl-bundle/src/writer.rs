//! Bundle writer for creating export bundles.
//!
//! Creates ZIP archives with manifest and checksums. The export profile is
//! enforced while files are added, so a shareable bundle can never be built
//! with an audit log inside.

use crate::manifest::{AUDIT_FILE_NAME, CLEAN_FILE_NAME, MANIFEST_FILE_NAME, SUMMARY_FILE_NAME};
use crate::{BundleError, BundleManifest, ExportProfile, FileEntry, Result};
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use tracing::{debug, info, warn};
use vl_redact::{AuditLog, CleanDocument, RedactError, RedactionSummary};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

/// File type hints for MIME type assignment.
#[derive(Debug, Clone, Copy)]
pub enum FileType {
    Json,
    Text,
    Binary,
}

impl FileType {
    fn mime_type(&self) -> &'static str {
        match self {
            FileType::Json => "application/json",
            FileType::Text => "text/plain; charset=utf-8",
            FileType::Binary => "application/octet-stream",
        }
    }

    fn from_path(path: &str) -> Self {
        if path.ends_with(".json") {
            FileType::Json
        } else if path.ends_with(".txt") {
            FileType::Text
        } else {
            FileType::Binary
        }
    }
}

/// Builder for export bundles.
pub struct BundleWriter {
    manifest: BundleManifest,
    files: Vec<(String, Vec<u8>)>,
}

impl BundleWriter {
    /// Create an empty bundle writer.
    pub fn new(
        export_profile: ExportProfile,
        document_hash: impl Into<String>,
        clean_document_hash: impl Into<String>,
    ) -> Self {
        Self {
            manifest: BundleManifest::new(export_profile, document_hash, clean_document_hash),
            files: Vec::new(),
        }
    }

    /// Create a writer populated from one redaction.
    ///
    /// Adds the clean text and summary; the audit log is added only for the
    /// local profile. The bundle timestamp is the audit log's.
    pub fn for_redaction(
        export_profile: ExportProfile,
        clean: &CleanDocument,
        log: &AuditLog,
    ) -> Result<Self> {
        if !clean.is_intact() || clean.hash() != log.clean_document_hash {
            return Err(BundleError::Redact(RedactError::IntegrityMismatch {
                subject: "clean document".to_string(),
                expected: log.clean_document_hash.clone(),
                actual: clean.hash().to_string(),
            }));
        }

        let mut writer = Self::new(export_profile, &log.document_hash, clean.hash())
            .with_created_at(log.created_at);
        if let Some(version) = &log.ruleset_version {
            writer = writer.with_ruleset_version(version);
        }

        writer.add_clean_document(clean)?;
        writer.add_summary(&log.summary())?;
        if export_profile.allows_audit_log() {
            writer.add_audit_log(log)?;
        }
        Ok(writer)
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.manifest = self.manifest.with_created_at(created_at);
        self
    }

    pub fn with_ruleset_version(mut self, version: impl Into<String>) -> Self {
        self.manifest = self.manifest.with_ruleset_version(version);
        self
    }

    pub fn with_tool_version(mut self, version: impl Into<String>) -> Self {
        self.manifest = self.manifest.with_tool_version(version);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.manifest = self.manifest.with_description(description);
        self
    }

    /// Add a file to the bundle with automatic checksum.
    ///
    /// Adding a path twice replaces the earlier content.
    pub fn add_file(
        &mut self,
        path: impl Into<String>,
        data: Vec<u8>,
        file_type: Option<FileType>,
    ) -> Result<()> {
        let path = path.into();
        if path == MANIFEST_FILE_NAME {
            return Err(BundleError::ProfileViolation(format!(
                "{} is reserved",
                MANIFEST_FILE_NAME
            )));
        }
        if path == AUDIT_FILE_NAME && !self.manifest.export_profile.allows_audit_log() {
            warn!(profile = %self.manifest.export_profile, "Refused to add audit log");
            return Err(BundleError::ProfileViolation(format!(
                "{} bundles never contain {}",
                self.manifest.export_profile, AUDIT_FILE_NAME
            )));
        }

        let file_type = file_type.unwrap_or_else(|| FileType::from_path(&path));
        let entry = FileEntry::for_data(&path, &data).with_mime_type(file_type.mime_type());
        let bytes = entry.bytes;

        self.manifest.files.retain(|f| f.path != path);
        self.files.retain(|(p, _)| *p != path);
        self.manifest.add_file(entry);

        debug!(path = %path, bytes, "Added file to bundle");
        self.files.push((path, data));
        Ok(())
    }

    /// Add a JSON-serializable value as a file.
    pub fn add_json<T: serde::Serialize>(
        &mut self,
        path: impl Into<String>,
        value: &T,
    ) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        self.add_file(path, json.into_bytes(), Some(FileType::Json))
    }

    /// Add the clean document text.
    pub fn add_clean_document(&mut self, clean: &CleanDocument) -> Result<()> {
        if clean.hash() != self.manifest.clean_document_hash {
            return Err(BundleError::CorruptedManifest(format!(
                "clean document hash {} does not match bundle",
                clean.hash()
            )));
        }
        self.add_file(
            CLEAN_FILE_NAME,
            clean.content().as_bytes().to_vec(),
            Some(FileType::Text),
        )
    }

    /// Add the redaction summary.
    pub fn add_summary(&mut self, summary: &RedactionSummary) -> Result<()> {
        self.add_json(SUMMARY_FILE_NAME, summary)
    }

    /// Add the audit log. Only permitted for the local profile.
    pub fn add_audit_log(&mut self, log: &AuditLog) -> Result<()> {
        if log.document_hash != self.manifest.document_hash
            || log.clean_document_hash != self.manifest.clean_document_hash
        {
            return Err(BundleError::CorruptedManifest(
                "audit log belongs to a different redaction".to_string(),
            ));
        }
        self.add_file(AUDIT_FILE_NAME, log.to_json()?.into_bytes(), Some(FileType::Json))
    }

    /// Get the current manifest (for inspection before writing).
    pub fn manifest(&self) -> &BundleManifest {
        &self.manifest
    }

    pub fn export_profile(&self) -> ExportProfile {
        self.manifest.export_profile
    }

    /// Get total size in bytes before compression.
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|(_, data)| data.len() as u64).sum()
    }

    /// Get file count (not including manifest).
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    fn prepare(&mut self) -> Result<String> {
        // Sort files for deterministic ordering
        self.manifest.sort_files();
        self.files.sort_by(|a, b| a.0.cmp(&b.0));
        self.manifest.validate()?;
        self.manifest.to_json()
    }

    fn write_archive<W: Write + Seek>(&self, sink: W, manifest_json: &str) -> Result<W> {
        let mut zip = ZipWriter::new(sink);

        let options: FileOptions<'_, ()> = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        // Manifest first
        zip.start_file(MANIFEST_FILE_NAME, options)?;
        zip.write_all(manifest_json.as_bytes())?;

        for (file_path, data) in &self.files {
            zip.start_file(file_path.as_str(), options)?;
            zip.write_all(data)?;
        }

        Ok(zip.finish()?)
    }

    /// Write the bundle to a file.
    pub fn write(mut self, path: &Path) -> Result<BundleManifest> {
        let manifest_json = self.prepare()?;
        let file = File::create(path)?;
        self.write_archive(file, &manifest_json)?;

        info!(
            path = %path.display(),
            files = self.files.len(),
            bytes = self.total_bytes(),
            profile = %self.manifest.export_profile,
            "Bundle written"
        );

        Ok(self.manifest)
    }

    /// Write the bundle to a byte vector (for in-memory use).
    pub fn write_to_vec(mut self) -> Result<(Vec<u8>, BundleManifest)> {
        let manifest_json = self.prepare()?;
        let buffer = self.write_archive(Cursor::new(Vec::new()), &manifest_json)?;
        let bytes = buffer.into_inner();

        info!(
            files = self.files.len(),
            compressed_bytes = bytes.len(),
            uncompressed_bytes = self.total_bytes(),
            profile = %self.manifest.export_profile,
            "Bundle written to memory"
        );

        Ok((bytes, self.manifest))
    }
}
