//! Export bundles for redaction artifacts.
//!
//! A bundle packages the output of one redaction for handoff. Which files it
//! may carry depends on who receives it.
//!
//! # Bundle Format
//!
//! Bundles are ZIP archives containing:
//! - `manifest.json`: Metadata, document hashes, file listing with checksums
//! - `clean.txt`: The clean document
//! - `summary.json`: Placeholder counts per category
//! - `audit.json`: The audit log (local profile only)
//!
//! # Export Profiles
//!
//! - `local`: Everything needed to restore the original. Never leaves the
//!   session owner.
//! - `shareable`: Clean text and summary only. The writer refuses to add an
//!   audit log and the reader refuses to open a shareable bundle that has one.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use vl_bundle::{BundleReader, BundleWriter, ExportProfile};
//! # fn artifacts() -> (vl_redact::CleanDocument, vl_redact::AuditLog) { unimplemented!() }
//!
//! let (clean, log) = artifacts();
//! BundleWriter::for_redaction(ExportProfile::Shareable, &clean, &log)
//!     .unwrap()
//!     .write(Path::new("handoff.zip"))
//!     .unwrap();
//!
//! let mut reader = BundleReader::open(Path::new("handoff.zip")).unwrap();
//! let clean = reader.read_clean_document().unwrap();
//! assert!(reader.read_audit_log().unwrap().is_none());
//! ```

pub mod error;
pub mod manifest;
pub mod reader;
pub mod writer;

pub use error::{BundleError, Result};
pub use manifest::{
    BundleManifest, ExportProfile, FileEntry, AUDIT_FILE_NAME, BUNDLE_SCHEMA_VERSION,
    CLEAN_FILE_NAME, MANIFEST_FILE_NAME, SUMMARY_FILE_NAME,
};
pub use reader::BundleReader;
pub use writer::{BundleWriter, FileType};
