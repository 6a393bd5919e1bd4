//! Span resolution.
//!
//! Turns the overlapping candidate spans from all detectors into a single
//! ordered, non-overlapping list. Resolution is total: overlaps and faulty
//! offsets produce warnings, never errors.

use crate::error::Result;
use crate::ruleset::{Action, JurisdictionRuleset};
use crate::{Category, Document, ResolvedSpan, Span};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

/// Configured ordering of detector ids used to break ties.
///
/// Listed ids rank in list order; unlisted ids rank after all listed ones,
/// ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetectorPriority(Vec<String>);

impl DetectorPriority {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(ids.into_iter().map(Into::into).collect())
    }

    pub fn ids(&self) -> &[String] {
        &self.0
    }

    /// Position of `id`, or the list length when unlisted.
    pub fn rank(&self, id: &str) -> usize {
        self.0.iter().position(|p| p == id).unwrap_or(self.0.len())
    }

    fn compare(&self, a: &str, b: &str) -> Ordering {
        self.rank(a).cmp(&self.rank(b)).then_with(|| a.cmp(b))
    }
}

/// Non-fatal observations made while resolving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ScanWarning {
    /// A span matched a FLAG_ONLY rule and needs human review.
    #[serde(rename_all = "camelCase")]
    Flagged {
        start: usize,
        end: usize,
        category: Category,
        detector_id: String,
    },
    /// A span lost to an overlapping, higher-ranked span.
    #[serde(rename_all = "camelCase")]
    OverlapDiscarded {
        start: usize,
        end: usize,
        category: Category,
        detector_id: String,
        kept_start: usize,
        kept_end: usize,
    },
    /// A detector produced offsets that do not fit the document.
    #[serde(rename_all = "camelCase")]
    InvalidSpanDropped {
        start: usize,
        end: usize,
        detector_id: String,
    },
}

/// Output of [`resolve`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    /// Spans to redact: non-overlapping, ascending by start.
    pub resolved: Vec<ResolvedSpan>,
    /// FLAG_ONLY spans surfaced for review, ascending by start.
    pub flagged: Vec<ResolvedSpan>,
    pub warnings: Vec<ScanWarning>,
}

/// Total order over candidates: start asc, longer first, detector priority,
/// category, then confidence desc.
fn candidate_order(priority: &DetectorPriority, a: &Span, b: &Span) -> Ordering {
    a.start
        .cmp(&b.start)
        .then_with(|| b.len().cmp(&a.len()))
        .then_with(|| priority.compare(&a.detector_id, &b.detector_id))
        .then_with(|| a.category.cmp(&b.category))
        .then_with(|| b.confidence.total_cmp(&a.confidence))
}

/// Resolve candidate spans against the active jurisdictions.
///
/// Fails only if a jurisdiction tag is unknown to the ruleset.
pub fn resolve<S: AsRef<str>>(
    document: &Document,
    spans: Vec<Span>,
    ruleset: &JurisdictionRuleset,
    jurisdictions: &[S],
    priority: &DetectorPriority,
) -> Result<Resolution> {
    ruleset.check_jurisdictions(jurisdictions)?;

    let mut warnings = Vec::new();
    let mut actions: BTreeMap<Category, Action> = BTreeMap::new();
    let mut candidates = Vec::new();
    let mut flagged = Vec::new();
    let mut ignored = 0usize;

    for span in spans {
        if document.slice(span.start, span.end).is_none() {
            warnings.push(ScanWarning::InvalidSpanDropped {
                start: span.start,
                end: span.end,
                detector_id: span.detector_id,
            });
            continue;
        }

        let action = match actions.get(&span.category) {
            Some(&action) => action,
            None => {
                let action = ruleset.resolve_action(jurisdictions, &span.category)?;
                actions.insert(span.category.clone(), action);
                action
            }
        };

        match action {
            Action::Ignore => ignored += 1,
            Action::FlagOnly => flagged.push(span),
            Action::Redact => candidates.push(span),
        }
    }

    flagged.sort_by(|a, b| candidate_order(priority, a, b));
    flagged.dedup_by(|b, a| a.start == b.start && a.end == b.end && a.category == b.category);
    for span in &flagged {
        warnings.push(ScanWarning::Flagged {
            start: span.start,
            end: span.end,
            category: span.category.clone(),
            detector_id: span.detector_id.clone(),
        });
    }

    candidates.sort_by(|a, b| candidate_order(priority, a, b));

    let mut resolved: Vec<ResolvedSpan> = Vec::with_capacity(candidates.len());
    for span in candidates {
        if let Some(kept) = resolved.last() {
            if span.start < kept.end {
                let duplicate =
                    span.start == kept.start && span.end == kept.end && span.category == kept.category;
                if !duplicate {
                    warnings.push(ScanWarning::OverlapDiscarded {
                        start: span.start,
                        end: span.end,
                        category: span.category,
                        detector_id: span.detector_id,
                        kept_start: kept.start,
                        kept_end: kept.end,
                    });
                }
                continue;
            }
        }
        let value = document.slice(span.start, span.end).unwrap_or_default();
        resolved.push(ResolvedSpan::from_span(span, value));
    }

    let flagged: Vec<ResolvedSpan> = flagged
        .into_iter()
        .map(|span| {
            let value = document.slice(span.start, span.end).unwrap_or_default();
            ResolvedSpan::from_span(span, value)
        })
        .collect();

    debug!(
        resolved = resolved.len(),
        flagged = flagged.len(),
        ignored,
        warnings = warnings.len(),
        "Resolved spans"
    );

    Ok(Resolution {
        resolved,
        flagged,
        warnings,
    })
}
