//! Semantic validation of settings against a ruleset.

use crate::error::{IssueKind, ValidationIssue};
use crate::settings::Settings;
use regex::Regex;
use std::collections::HashSet;
use vl_redact::ruleset::normalize_tag;
use vl_redact::{Category, JurisdictionRuleset};

/// Validate settings, returning every problem found.
///
/// Checks that jurisdictions exist in `ruleset`, categories are valid
/// identifiers, custom patterns compile, confidences lie in `[0, 1]`, and
/// detector ids and rule names are not repeated.
pub fn validate_settings(settings: &Settings, ruleset: &JurisdictionRuleset) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let mut seen_tags = HashSet::new();
    for (i, tag) in settings.jurisdictions.iter().enumerate() {
        let field = format!("jurisdictions[{}]", i);
        let normalized = normalize_tag(tag);
        if !ruleset.contains(&normalized) {
            issues.push(ValidationIssue::new(
                IssueKind::UnknownJurisdiction,
                field,
                format!("unknown jurisdiction '{}'", tag),
            ));
        } else if !seen_tags.insert(normalized) {
            issues.push(ValidationIssue::new(
                IssueKind::Duplicate,
                field,
                format!("'{}' listed twice", tag),
            ));
        }
    }

    let mut seen_ids = HashSet::new();
    for (i, id) in settings.detector_priority.iter().enumerate() {
        let field = format!("detector_priority[{}]", i);
        if id.trim().is_empty() {
            issues.push(ValidationIssue::new(
                IssueKind::InvalidValue,
                field,
                "detector id must not be empty",
            ));
        } else if !seen_ids.insert(id.as_str()) {
            issues.push(ValidationIssue::new(
                IssueKind::Duplicate,
                field,
                format!("detector '{}' listed twice", id),
            ));
        }
    }

    let mut seen_rules = HashSet::new();
    for (i, rule) in settings.custom_patterns.iter().enumerate() {
        let field = format!("custom_patterns[{}]", i);
        if rule.name.trim().is_empty() {
            issues.push(ValidationIssue::new(
                IssueKind::InvalidValue,
                format!("{}.name", field),
                "rule name must not be empty",
            ));
        } else if !seen_rules.insert(rule.name.as_str()) {
            issues.push(ValidationIssue::new(
                IssueKind::Duplicate,
                format!("{}.name", field),
                format!("rule '{}' defined twice", rule.name),
            ));
        }
        check_category(&mut issues, &format!("{}.category", field), &rule.category);
        if let Err(e) = Regex::new(&rule.pattern) {
            issues.push(ValidationIssue::new(
                IssueKind::InvalidPattern,
                format!("{}.pattern", field),
                e.to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&rule.confidence) {
            issues.push(ValidationIssue::new(
                IssueKind::InvalidValue,
                format!("{}.confidence", field),
                format!("must be in [0, 1], got {}", rule.confidence),
            ));
        }
    }

    for (i, entry) in settings.dictionary.iter().enumerate() {
        let field = format!("dictionary[{}]", i);
        check_category(&mut issues, &format!("{}.category", field), &entry.category);
        if let Some(j) = entry.terms.iter().position(|t| t.trim().is_empty()) {
            issues.push(ValidationIssue::new(
                IssueKind::InvalidValue,
                format!("{}.terms[{}]", field, j),
                "term must not be empty",
            ));
        }
    }

    issues
}

fn check_category(issues: &mut Vec<ValidationIssue>, field: &str, name: &str) {
    if Category::new(name).is_err() {
        issues.push(ValidationIssue::new(
            IssueKind::InvalidCategory,
            field,
            format!("'{}' is not an uppercase identifier", name),
        ));
    }
}
