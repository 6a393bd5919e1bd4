//! Splicing placeholders into a document.

use crate::error::{RedactError, Result};
use crate::placeholder::{find_placeholders, PlaceholderMapping};
use crate::{CleanDocument, Document};
use tracing::debug;

/// Check that mappings are in-bounds, boundary-aligned, ascending, disjoint
/// and consistent with the document text.
pub(crate) fn check_mappings(document: &Document, mappings: &[PlaceholderMapping]) -> Result<()> {
    let mut previous_end = 0usize;
    for (index, mapping) in mappings.iter().enumerate() {
        let Some(text) = document.slice(mapping.span_start, mapping.span_end) else {
            return Err(RedactError::InvalidSpan(format!(
                "mapping {} ({}..{}) does not fit the document",
                index, mapping.span_start, mapping.span_end
            )));
        };
        if index > 0 && mapping.span_start < previous_end {
            return Err(RedactError::InvalidSpan(format!(
                "mapping {} starts at {} before the previous span ends at {}",
                index, mapping.span_start, previous_end
            )));
        }
        if text != mapping.original_value {
            return Err(RedactError::InvalidSpan(format!(
                "mapping {} ({}..{}) does not match the document text",
                index, mapping.span_start, mapping.span_end
            )));
        }
        previous_end = mapping.span_end;
    }
    Ok(())
}

/// Reject untouched text that already contains placeholder syntax.
fn check_untouched(segment: &str, offset: usize) -> Result<()> {
    match find_placeholders(segment).first() {
        Some(token) => Err(RedactError::PlaceholderCollision {
            offset: offset + token.start,
        }),
        None => Ok(()),
    }
}

/// Replace every mapped span with its placeholder in one ascending pass.
///
/// The input document is not modified.
pub fn apply(document: &Document, mappings: &[PlaceholderMapping]) -> Result<CleanDocument> {
    check_mappings(document, mappings)?;

    let content = document.content();
    let mut out = String::with_capacity(content.len());
    let mut cursor = 0usize;

    for mapping in mappings {
        let untouched = &content[cursor..mapping.span_start];
        check_untouched(untouched, cursor)?;
        out.push_str(untouched);
        out.push_str(&mapping.placeholder_id);
        cursor = mapping.span_end;
    }

    let tail = &content[cursor..];
    check_untouched(tail, cursor)?;
    out.push_str(tail);

    let clean = CleanDocument::from_text(out);
    debug!(
        mappings = mappings.len(),
        clean_hash = clean.hash(),
        "Applied placeholders"
    );
    Ok(clean)
}
