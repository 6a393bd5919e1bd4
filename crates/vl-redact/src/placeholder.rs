//! Placeholder tokens and deterministic allocation.
//!
//! Tokens follow the grammar `[REDACTED_<CATEGORY>_<n>]` where `<n>` is a
//! positive integer without leading zeros. Numbering is per category, starting
//! at 1, in resolved-span order.

use crate::{Category, ResolvedSpan};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[REDACTED_([A-Z][A-Z0-9_]*)_([1-9][0-9]*)\]").expect("placeholder regex")
});

/// Render the token for the `ordinal`-th span of `category`.
pub fn format_placeholder(category: &Category, ordinal: u32) -> String {
    format!("[REDACTED_{}_{}]", category, ordinal)
}

/// Split a token into its category and ordinal.
pub fn parse_placeholder(token: &str) -> Option<(Category, u32)> {
    let caps = PLACEHOLDER_RE.captures(token)?;
    let whole = caps.get(0)?;
    if whole.start() != 0 || whole.end() != token.len() {
        return None;
    }
    let category = Category::new(caps.get(1)?.as_str()).ok()?;
    let ordinal = caps.get(2)?.as_str().parse().ok()?;
    Some((category, ordinal))
}

/// A token occurrence within a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderToken<'a> {
    pub start: usize,
    pub end: usize,
    pub id: &'a str,
}

/// All tokens in `text`, left to right.
pub fn find_placeholders(text: &str) -> Vec<PlaceholderToken<'_>> {
    PLACEHOLDER_RE
        .find_iter(text)
        .map(|m| PlaceholderToken {
            start: m.start(),
            end: m.end(),
            id: m.as_str(),
        })
        .collect()
}

/// The reversible link between a placeholder and the value it replaced.
///
/// `span_start`/`span_end` are byte offsets into the original document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderMapping {
    pub placeholder_id: String,
    pub category: Category,
    pub original_value: String,
    pub span_start: usize,
    pub span_end: usize,
}

/// Allocation behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocatorOptions {
    /// Reuse one id for repeated identical values within a category.
    #[serde(default)]
    pub dedupe_values: bool,
}

/// Deterministic per-category sequential id allocator.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderAllocator {
    options: AllocatorOptions,
}

impl PlaceholderAllocator {
    pub fn new(options: AllocatorOptions) -> Self {
        Self { options }
    }

    /// Assign ids to resolved spans in the order given.
    pub fn allocate(&self, spans: &[ResolvedSpan]) -> Vec<PlaceholderMapping> {
        let mut counters: BTreeMap<&Category, u32> = BTreeMap::new();
        let mut seen: BTreeMap<(&Category, &str), String> = BTreeMap::new();

        spans
            .iter()
            .map(|span| {
                let reused = if self.options.dedupe_values {
                    seen.get(&(&span.category, span.original_value.as_str())).cloned()
                } else {
                    None
                };

                let placeholder_id = match reused {
                    Some(id) => id,
                    None => {
                        let counter = counters.entry(&span.category).or_insert(0);
                        *counter += 1;
                        let id = format_placeholder(&span.category, *counter);
                        if self.options.dedupe_values {
                            seen.insert((&span.category, span.original_value.as_str()), id.clone());
                        }
                        id
                    }
                };

                PlaceholderMapping {
                    placeholder_id,
                    category: span.category.clone(),
                    original_value: span.original_value.clone(),
                    span_start: span.start,
                    span_end: span.end,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Span;

    fn resolved(start: usize, value: &str, category: Category) -> ResolvedSpan {
        ResolvedSpan::from_span(Span::new(start, start + value.len(), category, "t"), value)
    }

    #[test]
    fn test_format_and_parse() {
        let token = format_placeholder(&Category::DATE_OF_BIRTH, 12);
        assert_eq!(token, "[REDACTED_DATE_OF_BIRTH_12]");
        assert_eq!(parse_placeholder(&token), Some((Category::DATE_OF_BIRTH, 12)));
    }

    #[test]
    fn test_parse_rejects_bad_tokens() {
        assert_eq!(parse_placeholder("[REDACTED_NAME_0]"), None);
        assert_eq!(parse_placeholder("[REDACTED_NAME_01]"), None);
        assert_eq!(parse_placeholder("[REDACTED_name_1]"), None);
        assert_eq!(parse_placeholder("x[REDACTED_NAME_1]"), None);
        assert_eq!(parse_placeholder("[REDACTED_NAME]"), None);
    }

    #[test]
    fn test_find_placeholders() {
        let text = "Patient [REDACTED_NAME_1], SSN [REDACTED_SSN_1] [REDACTED_X]";
        let ids: Vec<&str> = find_placeholders(text).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["[REDACTED_NAME_1]", "[REDACTED_SSN_1]"]);
        assert_eq!(find_placeholders(text)[0].start, 8);
    }

    #[test]
    fn test_per_category_sequence() {
        let spans = vec![
            resolved(0, "John", Category::NAME),
            resolved(10, "123-45-6789", Category::SSN),
            resolved(30, "Jane", Category::NAME),
        ];
        let ids: Vec<String> = PlaceholderAllocator::default()
            .allocate(&spans)
            .into_iter()
            .map(|m| m.placeholder_id)
            .collect();
        assert_eq!(
            ids,
            vec!["[REDACTED_NAME_1]", "[REDACTED_SSN_1]", "[REDACTED_NAME_2]"]
        );
    }

    #[test]
    fn test_identical_values_distinct_by_default() {
        let spans = vec![resolved(0, "John", Category::NAME), resolved(9, "John", Category::NAME)];
        let mappings = PlaceholderAllocator::default().allocate(&spans);
        assert_eq!(mappings[0].placeholder_id, "[REDACTED_NAME_1]");
        assert_eq!(mappings[1].placeholder_id, "[REDACTED_NAME_2]");
    }

    #[test]
    fn test_dedupe_values_reuses_ids() {
        let spans = vec![
            resolved(0, "John", Category::NAME),
            resolved(9, "Jane", Category::NAME),
            resolved(20, "John", Category::NAME),
        ];
        let allocator = PlaceholderAllocator::new(AllocatorOptions { dedupe_values: true });
        let ids: Vec<String> = allocator
            .allocate(&spans)
            .into_iter()
            .map(|m| m.placeholder_id)
            .collect();
        assert_eq!(
            ids,
            vec!["[REDACTED_NAME_1]", "[REDACTED_NAME_2]", "[REDACTED_NAME_1]"]
        );
    }

    #[test]
    fn test_mapping_json_fields() {
        let mapping = PlaceholderAllocator::default().allocate(&[resolved(8, "John Doe", Category::NAME)]);
        let json = serde_json::to_value(&mapping[0]).unwrap();
        assert_eq!(json["placeholderId"], "[REDACTED_NAME_1]");
        assert_eq!(json["spanStart"], 8);
        assert_eq!(json["spanEnd"], 16);
    }
}
