//! Post-redaction leak check.
//!
//! Looks for original values that still appear verbatim in the clean text,
//! e.g. a name redacted in one place but missed by detectors elsewhere.

use crate::audit::AuditLog;
use crate::placeholder::find_placeholders;
use crate::{Category, CleanDocument};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LeakSeverity {
    Critical,
    Warning,
}

/// One verbatim occurrence of a redacted value in the clean text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leak {
    pub category: Category,
    /// Masked rendering of the value; never the full value.
    pub preview: String,
    /// Byte offset in the clean text.
    pub offset: usize,
    pub severity: LeakSeverity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeakReport {
    /// 100 when nothing leaked; drops with the share of leaked values.
    pub score: u8,
    pub distinct_values: usize,
    pub leaked_values: usize,
    pub leaks: Vec<Leak>,
}

impl LeakReport {
    pub fn is_clean(&self) -> bool {
        self.leaks.is_empty()
    }

    pub fn critical_count(&self) -> usize {
        self.leaks
            .iter()
            .filter(|l| l.severity == LeakSeverity::Critical)
            .count()
    }
}

/// Mask a value for display: keep the first character of longer values.
pub fn mask_value(value: &str) -> String {
    let count = value.chars().count();
    if count <= 3 {
        return "*".repeat(count);
    }
    let mut masked = String::new();
    if let Some(first) = value.chars().next() {
        masked.push(first);
    }
    masked.push_str(&"*".repeat((count - 1).min(8)));
    masked
}

/// Scan `clean` for original values recorded in `log`.
///
/// Matches inside placeholder tokens do not count.
pub fn check_leaks(clean: &CleanDocument, log: &AuditLog) -> LeakReport {
    let text = clean.content();
    let tokens: Vec<(usize, usize)> = find_placeholders(text)
        .iter()
        .map(|t| (t.start, t.end))
        .collect();
    let inside_token =
        |start: usize, end: usize| tokens.iter().any(|&(ts, te)| start < te && ts < end);

    let mut distinct = BTreeSet::new();
    let mut leaked = BTreeSet::new();
    let mut leaks = Vec::new();

    for mapping in &log.mappings {
        let value = mapping.original_value.as_str();
        if value.trim().is_empty() || !distinct.insert((&mapping.category, value)) {
            continue;
        }

        let severity = if mapping.category.is_direct_identifier() {
            LeakSeverity::Critical
        } else {
            LeakSeverity::Warning
        };

        for (offset, found) in text.match_indices(value) {
            if inside_token(offset, offset + found.len()) {
                continue;
            }
            leaked.insert((&mapping.category, value));
            leaks.push(Leak {
                category: mapping.category.clone(),
                preview: mask_value(value),
                offset,
                severity,
            });
        }
    }

    leaks.sort_by(|a, b| a.offset.cmp(&b.offset).then_with(|| a.category.cmp(&b.category)));

    let score = if distinct.is_empty() {
        100
    } else {
        let ratio = 1.0 - leaked.len() as f64 / distinct.len() as f64;
        (ratio * 100.0).round().clamp(0.0, 100.0) as u8
    };

    if leaks.is_empty() {
        debug!(values = distinct.len(), "No leaks found");
    } else {
        warn!(
            leaks = leaks.len(),
            leaked_values = leaked.len(),
            score,
            "Redacted values still present in clean text"
        );
    }

    LeakReport {
        score,
        distinct_values: distinct.len(),
        leaked_values: leaked.len(),
        leaks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditLogBuilder;
    use crate::placeholder::PlaceholderMapping;
    use crate::Document;

    fn log_for(document: &Document, clean: &CleanDocument, mappings: Vec<PlaceholderMapping>) -> AuditLog {
        AuditLogBuilder::new(document, clean).mappings(mappings).build()
    }

    fn mapping(id: &str, category: Category, value: &str, start: usize) -> PlaceholderMapping {
        PlaceholderMapping {
            placeholder_id: id.to_string(),
            category,
            original_value: value.to_string(),
            span_start: start,
            span_end: start + value.len(),
        }
    }

    #[test]
    fn test_mask_value() {
        assert_eq!(mask_value("Jo"), "**");
        assert_eq!(mask_value("John Doe"), "J*******");
        assert_eq!(mask_value("123-45-6789"), "1********");
    }

    #[test]
    fn test_clean_output_scores_100() {
        let doc = Document::new("Patient John Doe");
        let clean = CleanDocument::from_text("Patient [REDACTED_NAME_1]");
        let log = log_for(&doc, &clean, vec![mapping("[REDACTED_NAME_1]", Category::NAME, "John Doe", 8)]);
        let report = check_leaks(&clean, &log);
        assert!(report.is_clean());
        assert_eq!(report.score, 100);
    }

    #[test]
    fn test_missed_occurrence_is_reported() {
        let doc = Document::new("John Doe and SSN 123-45-6789; ask John Doe");
        let clean = CleanDocument::from_text("[REDACTED_NAME_1] and SSN [REDACTED_SSN_1]; ask John Doe");
        let log = log_for(
            &doc,
            &clean,
            vec![
                mapping("[REDACTED_NAME_1]", Category::NAME, "John Doe", 0),
                mapping("[REDACTED_SSN_1]", Category::SSN, "123-45-6789", 17),
            ],
        );
        let report = check_leaks(&clean, &log);
        assert_eq!(report.leaks.len(), 1);
        assert_eq!(report.leaks[0].severity, LeakSeverity::Warning);
        assert_eq!(report.leaks[0].preview, "J*******");
        assert_eq!(report.score, 50);
        assert_eq!(report.critical_count(), 0);
    }

    #[test]
    fn test_matches_inside_tokens_ignored() {
        let doc = Document::new("ACTED");
        let clean = CleanDocument::from_text("[REDACTED_ORGANIZATION_1]");
        let log = log_for(
            &doc,
            &clean,
            vec![mapping("[REDACTED_ORGANIZATION_1]", Category::ORGANIZATION, "ACTED", 0)],
        );
        assert!(check_leaks(&clean, &log).is_clean());
    }

    #[test]
    fn test_direct_identifier_is_critical() {
        let doc = Document::new("123-45-6789");
        let clean = CleanDocument::from_text("[REDACTED_SSN_1] (123-45-6789)");
        let log = log_for(&doc, &clean, vec![mapping("[REDACTED_SSN_1]", Category::SSN, "123-45-6789", 0)]);
        let report = check_leaks(&clean, &log);
        assert_eq!(report.critical_count(), 1);
        assert_eq!(report.score, 0);
    }
}
