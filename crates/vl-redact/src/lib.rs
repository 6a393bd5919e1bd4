//! Deterministic, reversible redaction engine.
//!
//! This crate detects sensitive spans in a document, replaces them with
//! numbered placeholders, and produces an audit log that lets an authorized
//! party restore the exact original.
//!
//! # Key Features
//!
//! - **Deterministic**: the same document, ruleset and session always produce
//!   byte-identical clean text and audit logs.
//! - **Reversible**: `restore(redact(D))` returns `D` exactly.
//! - **Tamper-evident**: clean and original documents are hash-checked on
//!   restore; audit logs can carry an HMAC-SHA256 seal.
//! - **Jurisdiction-aware**: GDPR, HIPAA, DPDP, PIPEDA, CCPA and LGPD tables
//!   ship built in; the strictest active rule wins.
//! - **Pluggable detection**: detectors implement the [`Detector`] trait and
//!   run concurrently against the immutable document.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vl_redact::{Category, Detector, DictionaryDetector, Document, JurisdictionRuleset,
//!     PatternDetector, RedactionSession};
//!
//! let session = RedactionSession::new(Arc::new(JurisdictionRuleset::builtin()), &["HIPAA"]).unwrap();
//!
//! let mut names = DictionaryDetector::new();
//! names.add_terms(Category::NAME, ["John Doe"], false).unwrap();
//! let detectors: Vec<Box<dyn Detector>> = vec![Box::new(PatternDetector::new()), Box::new(names)];
//!
//! let document = Document::new("Patient John Doe, SSN 123-45-6789");
//! let plan = session.scan(&document, &detectors).unwrap();
//! let redaction = session.redact(&document, &plan.resolved_spans).unwrap();
//! assert_eq!(
//!     redaction.clean_document.content(),
//!     "Patient [REDACTED_NAME_1], SSN [REDACTED_SSN_1]"
//! );
//!
//! let restored = session.restore(&redaction.clean_document, &redaction.audit_log).unwrap();
//! assert_eq!(restored, document);
//! ```

pub mod apply;
pub mod audit;
pub mod category;
pub mod detect;
pub mod document;
pub mod engine;
pub mod error;
pub mod hash;
pub mod leak;
pub mod placeholder;
pub mod resolve;
pub mod restore;
pub mod ruleset;
pub mod span;

pub use apply::apply;
pub use audit::{AuditLog, AuditLogBuilder, AuditSeal, RedactionSummary, AUDIT_SCHEMA_VERSION};
pub use category::Category;
pub use detect::{
    run_detectors, ApprovedFindings, Detector, DictionaryDetector, PatternDetector, PatternRule,
};
pub use document::{CleanDocument, Document};
pub use engine::{Redaction, RedactionSession, ScanReport};
pub use error::{RedactError, Result};
pub use hash::{content_hash, KeyManager, KeyMaterial};
pub use leak::{check_leaks, Leak, LeakReport, LeakSeverity};
pub use placeholder::{
    find_placeholders, format_placeholder, parse_placeholder, AllocatorOptions,
    PlaceholderAllocator, PlaceholderMapping,
};
pub use resolve::{resolve, DetectorPriority, Resolution, ScanWarning};
pub use restore::{restore, RestoreEngine};
pub use ruleset::{Action, JurisdictionRuleset};
pub use span::{ResolvedSpan, Span};
