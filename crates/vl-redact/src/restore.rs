//! Restoring the original document from a clean document and its audit log.
//!
//! Restore is all-or-nothing: every integrity check runs before any output is
//! returned, and any failure yields an error instead of partial text.

use crate::audit::AuditLog;
use crate::error::{RedactError, Result};
use crate::hash::{content_hash, KeyMaterial};
use crate::placeholder::{find_placeholders, PlaceholderMapping};
use crate::{CleanDocument, Document};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Validates artifacts and reconstructs originals.
#[derive(Debug, Clone, Default)]
pub struct RestoreEngine {
    seal_key: Option<KeyMaterial>,
}

impl RestoreEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require audit logs to carry a valid seal made with `key`.
    pub fn with_seal_key(mut self, key: KeyMaterial) -> Self {
        self.seal_key = Some(key);
        self
    }

    /// Reconstruct the original document.
    pub fn restore(&self, clean: &CleanDocument, log: &AuditLog) -> Result<Document> {
        log.validate()?;

        if let Some(key) = &self.seal_key {
            log.verify_seal(key)?;
        }

        let actual = content_hash(clean.content().as_bytes());
        if actual != clean.hash() {
            warn!(
                expected = clean.hash(),
                actual = %actual,
                "Clean document does not match its recorded hash"
            );
            return Err(RedactError::integrity("clean document", clean.hash(), actual));
        }
        if actual != log.clean_document_hash {
            warn!(
                expected = %log.clean_document_hash,
                actual = %actual,
                "Clean document does not belong to this audit log"
            );
            return Err(RedactError::integrity(
                "clean document",
                log.clean_document_hash.as_str(),
                actual,
            ));
        }

        let restored = splice_originals(clean.content(), log)?;

        let document = Document::new(restored);
        if document.hash() != log.document_hash {
            warn!(
                expected = %log.document_hash,
                actual = document.hash(),
                "Restored document hash mismatch"
            );
            return Err(RedactError::integrity(
                "restored document",
                log.document_hash.as_str(),
                document.hash(),
            ));
        }

        info!(
            document_hash = document.hash(),
            mappings = log.mappings.len(),
            "Restored document"
        );
        Ok(document)
    }
}

/// Replace tokens with their original values in one left-to-right pass.
///
/// The k-th token must be the k-th mapping's id, found exactly where the
/// mapping's original offset lands after earlier substitutions.
fn splice_originals(clean: &str, log: &AuditLog) -> Result<String> {
    let by_id: HashMap<&str, &PlaceholderMapping> = log
        .mappings
        .iter()
        .map(|m| (m.placeholder_id.as_str(), m))
        .collect();

    let tokens = find_placeholders(clean);
    let mut out = String::with_capacity(clean.len());
    let mut cursor = 0usize;
    // Clean offset minus original offset at the current position.
    let mut shift: i64 = 0;

    for (k, token) in tokens.iter().enumerate() {
        let Some(mapping) = by_id.get(token.id) else {
            warn!(offset = token.start, "Clean document references an unknown placeholder");
            return Err(RedactError::UnresolvedPlaceholder {
                placeholder: token.id.to_string(),
                offset: token.start,
            });
        };

        let Some(expected) = log.mappings.get(k) else {
            warn!(offset = token.start, "Clean document has more placeholders than the audit log");
            return Err(RedactError::integrity(
                "placeholder count",
                log.mappings.len().to_string(),
                tokens.len().to_string(),
            ));
        };

        let expected_start = expected.span_start as i64 + shift;
        if expected.placeholder_id != token.id || expected_start != token.start as i64 {
            warn!(
                index = k,
                offset = token.start,
                "Placeholder order does not match the audit log"
            );
            return Err(RedactError::integrity(
                "placeholder order",
                format!("{} at {}", expected.placeholder_id, expected_start),
                format!("{} at {}", token.id, token.start),
            ));
        }

        out.push_str(&clean[cursor..token.start]);
        out.push_str(&mapping.original_value);
        cursor = token.end;
        shift += mapping.placeholder_id.len() as i64 - mapping.original_value.len() as i64;
    }

    if tokens.len() != log.mappings.len() {
        warn!(
            expected = log.mappings.len(),
            actual = tokens.len(),
            "Placeholder count mismatch"
        );
        return Err(RedactError::integrity(
            "placeholder count",
            log.mappings.len().to_string(),
            tokens.len().to_string(),
        ));
    }

    out.push_str(&clean[cursor..]);
    debug!(tokens = tokens.len(), "Spliced original values");
    Ok(out)
}

/// Restore without seal verification.
pub fn restore(clean: &CleanDocument, log: &AuditLog) -> Result<Document> {
    RestoreEngine::new().restore(clean, log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::apply;
    use crate::audit::AuditLogBuilder;
    use crate::placeholder::PlaceholderAllocator;
    use crate::{Category, ResolvedSpan, Span};

    fn redacted(text: &str, spans: &[(usize, usize, Category)]) -> (Document, CleanDocument, AuditLog) {
        let document = Document::new(text);
        let resolved: Vec<ResolvedSpan> = spans
            .iter()
            .map(|(s, e, c)| {
                ResolvedSpan::from_span(Span::new(*s, *e, c.clone(), "t"), document.slice(*s, *e).unwrap())
            })
            .collect();
        let mappings = PlaceholderAllocator::default().allocate(&resolved);
        let clean = apply(&document, &mappings).unwrap();
        let log = AuditLogBuilder::new(&document, &clean).mappings(mappings).build();
        (document, clean, log)
    }

    fn example() -> (Document, CleanDocument, AuditLog) {
        redacted(
            "Patient John Doe, SSN 123-45-6789",
            &[(8, 16, Category::NAME), (22, 33, Category::SSN)],
        )
    }

    #[test]
    fn test_restore_exact() {
        let (document, clean, log) = example();
        let restored = restore(&clean, &log).unwrap();
        assert_eq!(restored, document);
    }

    #[test]
    fn test_restore_without_mappings() {
        let (document, clean, log) = redacted("nothing here", &[]);
        assert_eq!(restore(&clean, &log).unwrap(), document);
    }

    #[test]
    fn test_edited_clean_text_is_rejected() {
        let (_, clean, log) = example();
        let edited = clean.content().replacen("Patient", "patient", 1);

        let with_old_hash = CleanDocument::with_recorded_hash(edited.clone(), clean.hash());
        let err = restore(&with_old_hash, &log).unwrap_err();
        assert!(matches!(err, RedactError::IntegrityMismatch { .. }));

        let rehashed = CleanDocument::from_text(edited);
        let err = restore(&rehashed, &log).unwrap_err();
        assert!(matches!(err, RedactError::IntegrityMismatch { .. }));
    }

    #[test]
    fn test_mismatched_log_is_rejected() {
        let (_, clean, _) = example();
        let (_, _, other_log) = redacted("Patient Jane Roe", &[(8, 16, Category::NAME)]);
        let err = restore(&clean, &other_log).unwrap_err();
        assert!(matches!(err, RedactError::IntegrityMismatch { .. }));
    }

    #[test]
    fn test_missing_mapping_is_unresolved() {
        let (_, clean, mut log) = example();
        log.mappings.pop();
        let err = restore(&clean, &log).unwrap_err();
        assert!(matches!(
            err,
            RedactError::UnresolvedPlaceholder { ref placeholder, offset: 31 } if placeholder == "[REDACTED_SSN_1]"
        ));
    }

    #[test]
    fn test_edited_original_value_fails_final_hash() {
        let (_, clean, mut log) = example();
        log.mappings[0].original_value = "Jane Roe".to_string();
        let err = restore(&clean, &log).unwrap_err();
        assert!(matches!(
            err,
            RedactError::IntegrityMismatch { ref subject, .. } if subject == "restored document"
        ));
    }

    #[test]
    fn test_shifted_offsets_fail_order_check() {
        let (_, clean, mut log) = example();
        log.mappings[1].span_start = 23;
        log.mappings[1].span_end = 34;
        let err = restore(&clean, &log).unwrap_err();
        assert!(matches!(
            err,
            RedactError::IntegrityMismatch { ref subject, .. } if subject == "placeholder order"
        ));
    }

    #[test]
    fn test_seal_required_when_key_configured() {
        let key = KeyMaterial::from_bytes([3u8; 32], "k1");
        let (document, clean, mut log) = example();

        let engine = RestoreEngine::new().with_seal_key(key.clone());
        assert!(engine.restore(&clean, &log).is_err());

        log.seal(&key).unwrap();
        assert_eq!(engine.restore(&clean, &log).unwrap(), document);
    }

    #[test]
    fn test_malformed_log_checked_first() {
        let (_, clean, mut log) = example();
        log.schema_version = 7;
        assert!(matches!(
            restore(&clean, &log),
            Err(RedactError::MalformedAuditLog(_))
        ));
    }
}
