//! Redaction sessions.
//!
//! A [`RedactionSession`] is the explicit context for scanning, redacting and
//! restoring documents: ruleset, active jurisdictions, detector priority,
//! allocation options, creation timestamp and optional seal key. Sessions hold
//! no mutable state, so one session may process many documents and repeated
//! calls with the same input give byte-identical artifacts.

use crate::apply::{apply, check_mappings};
use crate::audit::{AuditLog, AuditLogBuilder};
use crate::detect::{run_detectors, Detector};
use crate::error::{RedactError, Result};
use crate::hash::KeyMaterial;
use crate::placeholder::{AllocatorOptions, PlaceholderAllocator, PlaceholderMapping};
use crate::resolve::{resolve, DetectorPriority, ScanWarning};
use crate::restore::RestoreEngine;
use crate::ruleset::JurisdictionRuleset;
use crate::{CleanDocument, Document, ResolvedSpan};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of a scan; also the on-disk redaction plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    /// Hash of the scanned document; a plan only applies to that document.
    pub document_hash: String,
    pub jurisdictions: Vec<String>,
    pub resolved_spans: Vec<ResolvedSpan>,
    pub flagged_spans: Vec<ResolvedSpan>,
    pub warnings: Vec<ScanWarning>,
}

impl ScanReport {
    pub fn has_flagged(&self) -> bool {
        !self.flagged_spans.is_empty()
    }
}

/// Artifacts of one redaction.
#[derive(Debug, Clone)]
pub struct Redaction {
    pub clean_document: CleanDocument,
    pub audit_log: AuditLog,
    /// The approved spans with their assigned placeholder ids.
    pub spans: Vec<ResolvedSpan>,
}

#[derive(Debug, Clone)]
pub struct RedactionSession {
    ruleset: Arc<JurisdictionRuleset>,
    jurisdictions: Vec<String>,
    priority: DetectorPriority,
    allocator: AllocatorOptions,
    created_at: DateTime<Utc>,
    seal_key: Option<KeyMaterial>,
}

impl RedactionSession {
    /// Start a session with a frozen set of active jurisdictions.
    pub fn new<S: AsRef<str>>(ruleset: Arc<JurisdictionRuleset>, jurisdictions: &[S]) -> Result<Self> {
        let jurisdictions = ruleset.check_jurisdictions(jurisdictions)?;
        if jurisdictions.is_empty() {
            return Err(RedactError::RulesetError(
                "at least one jurisdiction must be active".to_string(),
            ));
        }

        debug!(
            jurisdictions = ?jurisdictions,
            ruleset_version = ruleset.version(),
            "Started redaction session"
        );

        Ok(Self {
            ruleset,
            jurisdictions,
            priority: DetectorPriority::default(),
            allocator: AllocatorOptions::default(),
            created_at: Utc::now().trunc_subsecs(0),
            seal_key: None,
        })
    }

    pub fn with_priority(mut self, priority: DetectorPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_allocator_options(mut self, options: AllocatorOptions) -> Self {
        self.allocator = options;
        self
    }

    /// Pin the timestamp recorded in audit logs.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Seal audit logs on redact and require a valid seal on restore.
    pub fn with_seal_key(mut self, key: KeyMaterial) -> Self {
        self.seal_key = Some(key);
        self
    }

    pub fn ruleset(&self) -> &JurisdictionRuleset {
        &self.ruleset
    }

    pub fn jurisdictions(&self) -> &[String] {
        &self.jurisdictions
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Run detectors and resolve their output into a redaction plan.
    pub fn scan(&self, document: &Document, detectors: &[Box<dyn Detector>]) -> Result<ScanReport> {
        let candidates = run_detectors(document, detectors)?;
        debug!(candidates = candidates.len(), "Collected candidate spans");

        let resolution = resolve(
            document,
            candidates,
            &self.ruleset,
            self.jurisdictions.as_slice(),
            &self.priority,
        )?;

        Ok(ScanReport {
            document_hash: document.hash().to_string(),
            jurisdictions: self.jurisdictions.clone(),
            resolved_spans: resolution.resolved,
            flagged_spans: resolution.flagged,
            warnings: resolution.warnings,
        })
    }

    /// Redact the approved spans.
    ///
    /// Approved spans must be ascending, disjoint, aligned to character
    /// boundaries and carry the exact text they cover.
    pub fn redact(&self, document: &Document, approved: &[ResolvedSpan]) -> Result<Redaction> {
        check_plan(document, approved)?;

        let mappings = PlaceholderAllocator::new(self.allocator).allocate(approved);
        let clean_document = apply(document, &mappings)?;

        let spans = assign_ids(approved, &mappings);
        let mut audit_log = AuditLogBuilder::new(document, &clean_document)
            .created_at(self.created_at)
            .ruleset_version(self.ruleset.version())
            .mappings(mappings)
            .build();

        if let Some(key) = &self.seal_key {
            audit_log.seal(key)?;
        }

        info!(
            document_hash = document.hash(),
            clean_hash = clean_document.hash(),
            mappings = audit_log.mappings.len(),
            sealed = audit_log.is_sealed(),
            "Redacted document"
        );

        Ok(Redaction {
            clean_document,
            audit_log,
            spans,
        })
    }

    /// Redact with a plan file produced by [`scan`](Self::scan).
    pub fn redact_plan(&self, document: &Document, plan: &ScanReport) -> Result<Redaction> {
        if plan.document_hash != document.hash() {
            return Err(RedactError::InvalidSpan(format!(
                "plan was produced for document {}, not {}",
                plan.document_hash,
                document.hash()
            )));
        }
        self.redact(document, &plan.resolved_spans)
    }

    /// Restore the original document, verifying the seal if a key is set.
    pub fn restore(&self, clean: &CleanDocument, log: &AuditLog) -> Result<Document> {
        let mut engine = RestoreEngine::new();
        if let Some(key) = &self.seal_key {
            engine = engine.with_seal_key(key.clone());
        }
        engine.restore(clean, log)
    }
}

fn check_plan(document: &Document, approved: &[ResolvedSpan]) -> Result<()> {
    let as_mappings: Vec<PlaceholderMapping> = approved
        .iter()
        .map(|span| PlaceholderMapping {
            placeholder_id: String::new(),
            category: span.category.clone(),
            original_value: span.original_value.clone(),
            span_start: span.start,
            span_end: span.end,
        })
        .collect();
    check_mappings(document, &as_mappings)
}

fn assign_ids(approved: &[ResolvedSpan], mappings: &[PlaceholderMapping]) -> Vec<ResolvedSpan> {
    approved
        .iter()
        .zip(mappings)
        .map(|(span, mapping)| ResolvedSpan {
            placeholder_id: Some(mapping.placeholder_id.clone()),
            ..span.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{DictionaryDetector, PatternDetector};
    use crate::Category;

    fn session() -> RedactionSession {
        RedactionSession::new(Arc::new(JurisdictionRuleset::builtin()), &["HIPAA"])
            .unwrap()
            .with_created_at(
                DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
                    .unwrap()
                    .with_timezone(&Utc),
            )
    }

    fn detectors() -> Vec<Box<dyn Detector>> {
        let mut names = DictionaryDetector::new();
        names.add_terms(Category::NAME, ["John Doe"], false).unwrap();
        vec![Box::new(PatternDetector::new()), Box::new(names)]
    }

    #[test]
    fn test_rejects_empty_or_unknown_jurisdictions() {
        let ruleset = Arc::new(JurisdictionRuleset::builtin());
        let none: [&str; 0] = [];
        assert!(RedactionSession::new(ruleset.clone(), &none).is_err());
        assert!(matches!(
            RedactionSession::new(ruleset, &["XYZ"]),
            Err(RedactError::UnknownJurisdiction(_))
        ));
    }

    #[test]
    fn test_scan_redact_restore() {
        let session = session();
        let doc = Document::new("Patient John Doe, SSN 123-45-6789");
        let report = session.scan(&doc, &detectors()).unwrap();
        assert_eq!(report.resolved_spans.len(), 2);

        let redaction = session.redact(&doc, &report.resolved_spans).unwrap();
        assert_eq!(
            redaction.clean_document.content(),
            "Patient [REDACTED_NAME_1], SSN [REDACTED_SSN_1]"
        );
        assert_eq!(
            redaction.spans[1].placeholder_id.as_deref(),
            Some("[REDACTED_SSN_1]")
        );
        assert_eq!(
            redaction.audit_log.ruleset_version.as_deref(),
            Some(JurisdictionRuleset::BUILTIN_VERSION)
        );

        let restored = session
            .restore(&redaction.clean_document, &redaction.audit_log)
            .unwrap();
        assert_eq!(restored, doc);
    }

    #[test]
    fn test_plan_rejects_bad_spans() {
        let session = session();
        let doc = Document::new("Patient John Doe");
        let span = ResolvedSpan::from_span(
            crate::Span::new(8, 16, Category::NAME, "approved"),
            "Jane Roe",
        );
        assert!(matches!(
            session.redact(&doc, &[span]),
            Err(RedactError::InvalidSpan(_))
        ));
    }

    #[test]
    fn test_plan_for_other_document() {
        let session = session();
        let doc = Document::new("Patient John Doe");
        let report = session.scan(&doc, &detectors()).unwrap();
        let other = Document::new("Patient John Doe!");
        assert!(matches!(
            session.redact_plan(&other, &report),
            Err(RedactError::InvalidSpan(_))
        ));
    }

    #[test]
    fn test_sealed_session() {
        let key = KeyMaterial::from_bytes([5u8; 32], "k1");
        let session = session().with_seal_key(key);
        let doc = Document::new("SSN 123-45-6789");
        let report = session.scan(&doc, &detectors()).unwrap();
        let redaction = session.redact(&doc, &report.resolved_spans).unwrap();
        assert!(redaction.audit_log.is_sealed());

        let mut unsealed = redaction.audit_log.clone();
        unsealed.seal = None;
        assert!(session.restore(&redaction.clean_document, &unsealed).is_err());
        assert_eq!(
            session
                .restore(&redaction.clean_document, &redaction.audit_log)
                .unwrap(),
            doc
        );
    }
}
