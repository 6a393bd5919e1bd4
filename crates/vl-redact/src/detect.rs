//! Sensitive-span detection.
//!
//! Detectors implement the [`Detector`] capability. Three implementations ship
//! with the crate:
//!
//! - [`PatternDetector`]: regex rules (built-in rules for structured
//!   identifiers plus user rules).
//! - [`DictionaryDetector`]: exact-match term lists, e.g. known names.
//! - [`ApprovedFindings`]: a frozen, user-approved span list. Suggestions
//!   from non-deterministic sources (model-backed detectors) must pass through
//!   this before redaction.

use crate::error::{RedactError, Result};
use crate::{Category, Document, ResolvedSpan, Span};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, error};

/// Capability interface for span detectors.
///
/// Implementations must be deterministic for a fixed document and fixed
/// configuration, and must not hold mutable state across calls.
pub trait Detector: Send + Sync {
    /// Stable identifier used for priority tie-breaks.
    fn id(&self) -> &str;

    /// Produce candidate spans. Spans may overlap each other.
    fn detect(&self, document: &Document) -> Vec<Span>;
}

/// A single regex detection rule.
///
/// If the pattern has a capture group named `value`, only that group becomes
/// the span; otherwise the whole match does.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub name: String,
    pub category: Category,
    pub confidence: f32,
    regex: Regex,
    validator: Option<fn(&str) -> bool>,
}

impl PatternRule {
    /// Compile a rule.
    pub fn new(
        name: impl Into<String>,
        category: Category,
        pattern: &str,
        confidence: f32,
    ) -> Result<Self> {
        let name = name.into();
        let regex = Regex::new(pattern)
            .map_err(|e| RedactError::PatternError(format!("rule '{}': {}", name, e)))?;
        Ok(Self {
            name,
            category,
            confidence: confidence.clamp(0.0, 1.0),
            regex,
            validator: None,
        })
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    fn find_spans(&self, text: &str, detector_id: &str, out: &mut Vec<Span>) {
        for caps in self.regex.captures_iter(text) {
            let Some(m) = caps.name("value").or_else(|| caps.get(0)) else {
                continue;
            };
            if m.start() == m.end() {
                continue;
            }
            if let Some(valid) = self.validator {
                if !valid(m.as_str()) {
                    continue;
                }
            }
            out.push(
                Span::new(m.start(), m.end(), self.category.clone(), detector_id)
                    .with_confidence(self.confidence),
            );
        }
    }
}

fn builtin(
    name: &str,
    category: Category,
    pattern: &str,
    confidence: f32,
    validator: Option<fn(&str) -> bool>,
) -> PatternRule {
    PatternRule {
        name: name.to_string(),
        category,
        confidence,
        regex: Regex::new(pattern).expect("builtin pattern compiles"),
        validator,
    }
}

// Pre-compiled built-in rules, most specific first.
static BUILTIN_RULES: Lazy<Vec<PatternRule>> = Lazy::new(|| {
    vec![
        builtin("aws_access_key", Category::SECRET, r"AKIA[0-9A-Z]{16}", 0.99, None),
        builtin(
            "github_token",
            Category::SECRET,
            r"gh[pousr]_[A-Za-z0-9_]{36,}",
            0.99,
            None,
        ),
        builtin(
            "ai_api_key",
            Category::SECRET,
            r"sk-(?:ant-)?[A-Za-z0-9_-]{20,}",
            0.95,
            None,
        ),
        builtin(
            "jwt",
            Category::SECRET,
            r"eyJ[A-Za-z0-9_-]+\.eyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+",
            0.95,
            None,
        ),
        builtin(
            "email",
            Category::EMAIL,
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}\b",
            0.99,
            None,
        ),
        builtin("ssn", Category::SSN, r"\b\d{3}-\d{2}-\d{4}\b", 0.95, None),
        builtin(
            "credit_card",
            Category::CREDIT_CARD,
            r"\b(?:\d{4}[ -]?){3}\d{4}\b",
            0.9,
            Some(luhn_valid),
        ),
        builtin(
            "phone",
            Category::PHONE,
            r"(?:\+\d{1,3}[ .-]?)?(?:\(\d{3}\)\s?|\b\d{3}[ .-])\d{3}[ .-]\d{4}\b",
            0.8,
            None,
        ),
        builtin(
            "ipv4",
            Category::IP_ADDRESS,
            r"\b(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\b",
            0.9,
            None,
        ),
        builtin(
            "date_of_birth",
            Category::DATE_OF_BIRTH,
            r"(?i)\b(?:dob|date of birth|born(?: on)?)\s*[:\-]?\s*(?P<value>\d{1,2}[/.-]\d{1,2}[/.-]\d{2,4}|\d{4}-\d{2}-\d{2})\b",
            0.85,
            None,
        ),
        builtin(
            "medical_record",
            Category::MEDICAL_RECORD,
            r"(?i)\b(?:mrn|medical record(?: number| no\.?)?)\s*[:#]?\s*(?P<value>\d{6,10})\b",
            0.9,
            None,
        ),
    ]
});

/// Luhn checksum over the digits of a card-number candidate.
fn luhn_valid(candidate: &str) -> bool {
    let digits: Vec<u32> = candidate.chars().filter_map(|c| c.to_digit(10)).collect();
    if !(13..=19).contains(&digits.len()) {
        return false;
    }

    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();

    sum % 10 == 0
}

/// Regex-based detector.
#[derive(Debug, Clone)]
pub struct PatternDetector {
    id: String,
    rules: Vec<PatternRule>,
}

impl PatternDetector {
    pub const DEFAULT_ID: &'static str = "pattern";

    /// Detector with the built-in rule set.
    pub fn new() -> Self {
        Self {
            id: Self::DEFAULT_ID.to_string(),
            rules: BUILTIN_RULES.clone(),
        }
    }

    /// Detector with no rules.
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rules: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Append a rule. Rules run in insertion order.
    pub fn add_rule(&mut self, rule: PatternRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }
}

impl Default for PatternDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for PatternDetector {
    fn id(&self) -> &str {
        &self.id
    }

    fn detect(&self, document: &Document) -> Vec<Span> {
        let mut spans = Vec::new();
        for rule in &self.rules {
            rule.find_spans(document.content(), &self.id, &mut spans);
        }
        spans
    }
}

#[derive(Debug, Clone)]
struct DictionaryEntry {
    category: Category,
    regex: Regex,
}

/// Exact-match term detector.
///
/// Terms match on word boundaries where the term itself starts or ends with a
/// word character, so `Ann` does not fire inside `Annual`.
#[derive(Debug, Clone)]
pub struct DictionaryDetector {
    id: String,
    entries: Vec<DictionaryEntry>,
}

impl DictionaryDetector {
    pub const DEFAULT_ID: &'static str = "dictionary";

    pub fn new() -> Self {
        Self {
            id: Self::DEFAULT_ID.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Register terms for a category. Empty terms are ignored.
    pub fn add_terms<I, S>(&mut self, category: Category, terms: I, case_insensitive: bool) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut terms: Vec<String> = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if terms.is_empty() {
            return Ok(());
        }

        // Longest first so alternation prefers "John Doe" over "John".
        terms.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        terms.dedup();

        let alternatives: Vec<String> = terms.iter().map(|t| bounded_term(t)).collect();
        let flags = if case_insensitive { "(?i)" } else { "" };
        let pattern = format!("{}(?:{})", flags, alternatives.join("|"));

        let regex = Regex::new(&pattern)
            .map_err(|e| RedactError::PatternError(format!("dictionary '{}': {}", category, e)))?;
        self.entries.push(DictionaryEntry { category, regex });
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn bounded_term(term: &str) -> String {
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let mut out = String::new();
    if is_word(term.chars().next()) {
        out.push_str(r"\b");
    }
    out.push_str(&regex::escape(term));
    if is_word(term.chars().last()) {
        out.push_str(r"\b");
    }
    out
}

impl Default for DictionaryDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for DictionaryDetector {
    fn id(&self) -> &str {
        &self.id
    }

    fn detect(&self, document: &Document) -> Vec<Span> {
        let mut spans = Vec::new();
        for entry in &self.entries {
            for m in entry.regex.find_iter(document.content()) {
                spans.push(Span::new(m.start(), m.end(), entry.category.clone(), &self.id));
            }
        }
        spans
    }
}

/// A frozen list of user-approved findings.
///
/// Replays its spans verbatim, keeping their original detector ids so
/// priority tie-breaks behave as they did at review time.
#[derive(Debug, Clone)]
pub struct ApprovedFindings {
    id: String,
    spans: Vec<Span>,
}

impl ApprovedFindings {
    pub const DEFAULT_ID: &'static str = "approved";

    pub fn new(spans: Vec<Span>) -> Self {
        Self {
            id: Self::DEFAULT_ID.to_string(),
            spans,
        }
    }

    pub fn from_resolved(spans: &[ResolvedSpan]) -> Self {
        Self::new(spans.iter().map(ResolvedSpan::to_span).collect())
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

impl Detector for ApprovedFindings {
    fn id(&self) -> &str {
        &self.id
    }

    fn detect(&self, _document: &Document) -> Vec<Span> {
        self.spans.clone()
    }
}

/// Run detectors concurrently against one document.
///
/// Each detector runs on its own scoped thread; the call returns only after
/// all of them finish. Output is concatenated in detector order, so the result
/// does not depend on completion order.
pub fn run_detectors(document: &Document, detectors: &[Box<dyn Detector>]) -> Result<Vec<Span>> {
    let outputs: Vec<std::thread::Result<Vec<Span>>> = std::thread::scope(|s| {
        let handles: Vec<_> = detectors
            .iter()
            .map(|detector| s.spawn(move || detector.detect(document)))
            .collect();

        handles.into_iter().map(|h| h.join()).collect()
    });

    let mut spans = Vec::new();
    for (detector, output) in detectors.iter().zip(outputs) {
        match output {
            Ok(found) => {
                debug!(detector = detector.id(), spans = found.len(), "Detector finished");
                spans.extend(found);
            }
            Err(_) => {
                error!(detector = detector.id(), "Detector panicked");
                return Err(RedactError::DetectorFailed(detector.id().to_string()));
            }
        }
    }

    Ok(spans)
}
