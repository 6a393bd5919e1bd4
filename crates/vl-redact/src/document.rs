//! Immutable document buffers.
//!
//! Offsets everywhere in this crate are byte offsets into the UTF-8 content and
//! must fall on `char` boundaries.

use crate::hash::content_hash;
use serde::{Deserialize, Serialize};

/// An original document with the content hash computed at ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    content: String,
    hash: String,
}

impl Document {
    /// Ingest a document, computing its content hash.
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let hash = content_hash(content.as_bytes());
        Self { content, hash }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// SHA-256 hex digest of the content.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// The substring for `start..end`, or `None` if the range is out of
    /// bounds, empty, or splits a character.
    pub fn slice(&self, start: usize, end: usize) -> Option<&str> {
        if start >= end {
            return None;
        }
        self.content.get(start..end)
    }
}

/// A document with every resolved span replaced by its placeholder.
///
/// The recorded hash travels with the text so restore can detect edits made
/// after redaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanDocument {
    content: String,
    hash: String,
}

impl CleanDocument {
    /// Wrap freshly produced clean text, recording its hash.
    pub fn from_text(content: impl Into<String>) -> Self {
        let content = content.into();
        let hash = content_hash(content.as_bytes());
        Self { content, hash }
    }

    /// Pair clean text with a hash recorded elsewhere (e.g. a bundle manifest).
    ///
    /// No check happens here; restore compares the two.
    pub fn with_recorded_hash(content: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            hash: hash.into(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// The recorded content hash.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Whether the content still matches its recorded hash.
    pub fn is_intact(&self) -> bool {
        content_hash(self.content.as_bytes()) == self.hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_hash_is_stable() {
        let a = Document::new("Patient John Doe");
        let b = Document::new(String::from("Patient John Doe"));
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_slice_respects_char_boundaries() {
        let doc = Document::new("Zoë Müller");
        assert_eq!(doc.slice(0, 4), Some("Zoë"));
        assert_eq!(doc.slice(0, 3), None);
        assert_eq!(doc.slice(2, 2), None);
        assert_eq!(doc.slice(5, 100), None);
    }

    #[test]
    fn test_clean_document_detects_edits() {
        let clean = CleanDocument::from_text("Patient [REDACTED_NAME_1]");
        assert!(clean.is_intact());

        let edited = CleanDocument::with_recorded_hash("Patient [REDACTED_NAME_2]", clean.hash());
        assert!(!edited.is_intact());
    }
}
