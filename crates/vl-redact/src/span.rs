//! Candidate and resolved spans.

use crate::Category;
use serde::{Deserialize, Serialize};

/// A candidate sensitive range produced by a detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
    pub category: Category,
    /// Identifier of the detector that produced the span.
    pub detector_id: String,
    /// Detector confidence in `0.0..=1.0`.
    pub confidence: f32,
}

impl Span {
    /// Create a span with full confidence.
    pub fn new(start: usize, end: usize, category: Category, detector_id: impl Into<String>) -> Self {
        Self {
            start,
            end,
            category,
            detector_id: detector_id.into(),
            confidence: 1.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Whether the two half-open ranges share at least one byte.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A span that survived resolution, carrying the exact text it covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSpan {
    pub start: usize,
    pub end: usize,
    pub category: Category,
    pub detector_id: String,
    pub confidence: f32,
    /// The exact substring of the document.
    pub original_value: String,
    /// Assigned placeholder, once allocated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder_id: Option<String>,
}

impl ResolvedSpan {
    pub fn from_span(span: Span, original_value: impl Into<String>) -> Self {
        Self {
            start: span.start,
            end: span.end,
            category: span.category,
            detector_id: span.detector_id,
            confidence: span.confidence,
            original_value: original_value.into(),
            placeholder_id: None,
        }
    }

    /// The span without its resolved value.
    pub fn to_span(&self) -> Span {
        Span {
            start: self.start,
            end: self.end,
            category: self.category.clone(),
            detector_id: self.detector_id.clone(),
            confidence: self.confidence,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}
