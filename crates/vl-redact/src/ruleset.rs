//! Jurisdiction rulesets.
//!
//! A ruleset maps jurisdiction tags (GDPR, HIPAA, ...) to per-category actions.
//! Rulesets are immutable once built and are shared between sessions behind an
//! `Arc`.

use crate::error::{RedactError, Result};
use crate::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// What to do with spans of a category.
///
/// Variants are ordered by restrictiveness, so `max` picks the strictest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Ignore,
    FlagOnly,
    Redact,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Ignore => write!(f, "IGNORE"),
            Action::FlagOnly => write!(f, "FLAG_ONLY"),
            Action::Redact => write!(f, "REDACT"),
        }
    }
}

impl std::str::FromStr for Action {
    type Err = RedactError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "IGNORE" => Ok(Action::Ignore),
            "FLAG_ONLY" | "FLAG" => Ok(Action::FlagOnly),
            "REDACT" => Ok(Action::Redact),
            other => Err(RedactError::RulesetError(format!("unknown action '{}'", other))),
        }
    }
}

/// Normalize a jurisdiction tag for lookup.
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_ascii_uppercase()
}

type CategoryActions = BTreeMap<Category, Action>;

/// On-disk shape; tags are normalized on the way in.
#[derive(Deserialize)]
struct RulesetFile {
    version: String,
    #[serde(default)]
    jurisdictions: BTreeMap<String, CategoryActions>,
}

impl TryFrom<RulesetFile> for JurisdictionRuleset {
    type Error = RedactError;

    fn try_from(file: RulesetFile) -> Result<Self> {
        let mut jurisdictions = BTreeMap::new();
        for (tag, rules) in file.jurisdictions {
            let normalized = normalize_tag(&tag);
            if jurisdictions.insert(normalized.clone(), rules).is_some() {
                return Err(RedactError::RulesetError(format!(
                    "jurisdiction '{}' is defined more than once",
                    normalized
                )));
            }
        }
        Ok(Self {
            version: file.version,
            jurisdictions,
        })
    }
}

/// Versioned table of jurisdiction tag → category → action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RulesetFile")]
pub struct JurisdictionRuleset {
    version: String,
    jurisdictions: BTreeMap<String, CategoryActions>,
}

impl JurisdictionRuleset {
    /// Version string of the shipped ruleset.
    pub const BUILTIN_VERSION: &'static str = "builtin-2026.1";

    /// An empty ruleset.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            jurisdictions: BTreeMap::new(),
        }
    }

    /// The shipped ruleset covering GDPR, HIPAA, DPDP, PIPEDA, CCPA and LGPD.
    ///
    /// Categories not listed for a tag are ignored under that tag.
    pub fn builtin() -> Self {
        use Category as C;

        let mut ruleset = Self::new(Self::BUILTIN_VERSION);
        ruleset.insert_table(
            "GDPR",
            &[
                C::NAME,
                C::EMAIL,
                C::PHONE,
                C::ADDRESS,
                C::DATE_OF_BIRTH,
                C::IP_ADDRESS,
                C::NATIONAL_ID,
                C::PASSPORT,
                C::SSN,
                C::CREDIT_CARD,
                C::BANK_ACCOUNT,
                C::MEDICAL_RECORD,
                C::SECRET,
            ],
            &[C::LOCATION, C::ORGANIZATION],
        );
        ruleset.insert_table(
            "HIPAA",
            &[
                C::NAME,
                C::EMAIL,
                C::PHONE,
                C::ADDRESS,
                C::DATE_OF_BIRTH,
                C::SSN,
                C::MEDICAL_RECORD,
                C::IP_ADDRESS,
                C::CREDIT_CARD,
                C::BANK_ACCOUNT,
                C::PASSPORT,
                C::SECRET,
            ],
            &[C::NATIONAL_ID, C::LOCATION],
        );
        ruleset.insert_table(
            "DPDP",
            &[
                C::NAME,
                C::EMAIL,
                C::PHONE,
                C::ADDRESS,
                C::NATIONAL_ID,
                C::BANK_ACCOUNT,
                C::CREDIT_CARD,
                C::SSN,
                C::PASSPORT,
                C::SECRET,
            ],
            &[C::DATE_OF_BIRTH, C::IP_ADDRESS],
        );
        ruleset.insert_table(
            "PIPEDA",
            &[
                C::NAME,
                C::EMAIL,
                C::PHONE,
                C::ADDRESS,
                C::SSN,
                C::NATIONAL_ID,
                C::DATE_OF_BIRTH,
                C::BANK_ACCOUNT,
                C::CREDIT_CARD,
                C::MEDICAL_RECORD,
                C::SECRET,
            ],
            &[C::IP_ADDRESS],
        );
        ruleset.insert_table(
            "CCPA",
            &[
                C::NAME,
                C::EMAIL,
                C::ADDRESS,
                C::SSN,
                C::PASSPORT,
                C::NATIONAL_ID,
                C::CREDIT_CARD,
                C::BANK_ACCOUNT,
                C::IP_ADDRESS,
                C::MEDICAL_RECORD,
                C::SECRET,
            ],
            &[C::PHONE, C::DATE_OF_BIRTH],
        );
        ruleset.insert_table(
            "LGPD",
            &[
                C::NAME,
                C::EMAIL,
                C::PHONE,
                C::ADDRESS,
                C::NATIONAL_ID,
                C::SSN,
                C::DATE_OF_BIRTH,
                C::MEDICAL_RECORD,
                C::CREDIT_CARD,
                C::BANK_ACCOUNT,
                C::SECRET,
            ],
            &[C::IP_ADDRESS],
        );
        ruleset
    }

    fn insert_table(&mut self, tag: &str, redact: &[Category], flag: &[Category]) {
        let rules = self.jurisdictions.entry(normalize_tag(tag)).or_default();
        for category in redact {
            rules.insert(category.clone(), Action::Redact);
        }
        for category in flag {
            rules.insert(category.clone(), Action::FlagOnly);
        }
    }

    /// Return a copy with one rule added or replaced.
    pub fn with_rule(mut self, tag: &str, category: Category, action: Action) -> Self {
        self.jurisdictions
            .entry(normalize_tag(tag))
            .or_default()
            .insert(category, action);
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Registered tags in sorted order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.jurisdictions.keys().map(String::as_str)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.jurisdictions.contains_key(&normalize_tag(tag))
    }

    /// The category table for a tag.
    pub fn rules_for(&self, tag: &str) -> Option<&BTreeMap<Category, Action>> {
        self.jurisdictions.get(&normalize_tag(tag))
    }

    /// Normalize and check a set of tags, returning them sorted and deduplicated.
    pub fn check_jurisdictions<S: AsRef<str>>(&self, tags: &[S]) -> Result<Vec<String>> {
        let mut checked = Vec::with_capacity(tags.len());
        for tag in tags {
            let normalized = normalize_tag(tag.as_ref());
            if !self.jurisdictions.contains_key(&normalized) {
                return Err(RedactError::UnknownJurisdiction(tag.as_ref().to_string()));
            }
            checked.push(normalized);
        }
        checked.sort();
        checked.dedup();
        Ok(checked)
    }

    /// The most restrictive action any active tag assigns to `category`.
    ///
    /// An empty tag set yields [`Action::Ignore`].
    pub fn resolve_action<S: AsRef<str>>(&self, tags: &[S], category: &Category) -> Result<Action> {
        let mut action = Action::Ignore;
        for tag in tags {
            let rules = self
                .jurisdictions
                .get(&normalize_tag(tag.as_ref()))
                .ok_or_else(|| RedactError::UnknownJurisdiction(tag.as_ref().to_string()))?;
            if let Some(&found) = rules.get(category) {
                action = action.max(found);
            }
        }
        Ok(action)
    }

    /// Check structural constraints.
    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(RedactError::RulesetError("version must not be empty".to_string()));
        }
        if self.jurisdictions.is_empty() {
            return Err(RedactError::RulesetError(
                "ruleset defines no jurisdictions".to_string(),
            ));
        }
        for tag in self.jurisdictions.keys() {
            if tag.is_empty() || tag.chars().any(|c| c.is_whitespace() || c == ',') {
                return Err(RedactError::RulesetError(format!(
                    "invalid jurisdiction tag '{}'",
                    tag
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate a ruleset from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let ruleset: Self = serde_json::from_str(json)
            .map_err(|e| RedactError::RulesetError(format!("invalid ruleset: {}", e)))?;
        ruleset.validate()?;
        Ok(ruleset)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a ruleset from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save the ruleset as pretty JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

impl Default for JurisdictionRuleset {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_six_tags() {
        let ruleset = JurisdictionRuleset::builtin();
        let tags: Vec<&str> = ruleset.tags().collect();
        assert_eq!(tags, vec!["CCPA", "DPDP", "GDPR", "HIPAA", "LGPD", "PIPEDA"]);
        ruleset.validate().unwrap();
    }

    #[test]
    fn test_identifiers_redacted_everywhere() {
        let ruleset = JurisdictionRuleset::builtin();
        let tags: Vec<String> = ruleset.tags().map(str::to_string).collect();
        for tag in &tags {
            assert_eq!(
                ruleset.resolve_action(&[tag], &Category::SSN).unwrap(),
                Action::Redact
            );
            assert_eq!(
                ruleset.resolve_action(&[tag], &Category::SECRET).unwrap(),
                Action::Redact
            );
        }
    }

    #[test]
    fn test_most_restrictive_wins() {
        let ruleset = JurisdictionRuleset::builtin();
        assert_eq!(
            ruleset.resolve_action(&["CCPA"], &Category::PHONE).unwrap(),
            Action::FlagOnly
        );
        assert_eq!(
            ruleset.resolve_action(&["CCPA", "GDPR"], &Category::PHONE).unwrap(),
            Action::Redact
        );
        assert_eq!(
            ruleset.resolve_action(&["HIPAA"], &Category::ORGANIZATION).unwrap(),
            Action::Ignore
        );
    }

    #[test]
    fn test_tags_are_case_insensitive() {
        let ruleset = JurisdictionRuleset::builtin();
        assert_eq!(
            ruleset.resolve_action(&["hipaa"], &Category::NAME).unwrap(),
            Action::Redact
        );
        assert_eq!(
            ruleset.check_jurisdictions(&["gdpr", "GDPR", "hipaa"]).unwrap(),
            vec!["GDPR", "HIPAA"]
        );
    }

    #[test]
    fn test_unknown_jurisdiction() {
        let ruleset = JurisdictionRuleset::builtin();
        let err = ruleset.resolve_action(&["APPI"], &Category::NAME).unwrap_err();
        assert!(matches!(err, RedactError::UnknownJurisdiction(tag) if tag == "APPI"));
        assert!(ruleset.check_jurisdictions(&["GDPR", "APPI"]).is_err());
    }

    #[test]
    fn test_empty_tags_ignore() {
        let ruleset = JurisdictionRuleset::builtin();
        let none: [&str; 0] = [];
        assert_eq!(
            ruleset.resolve_action(&none, &Category::SSN).unwrap(),
            Action::Ignore
        );
    }

    #[test]
    fn test_user_defined_tag() {
        let ruleset = JurisdictionRuleset::new("custom-1")
            .with_rule("internal", Category::new("VENDOR_ID").unwrap(), Action::Redact);
        assert!(ruleset.contains("INTERNAL"));
        assert_eq!(
            ruleset
                .resolve_action(&["Internal"], &Category::new("vendor-id").unwrap())
                .unwrap(),
            Action::Redact
        );
    }

    #[test]
    fn test_json_roundtrip() {
        let ruleset = JurisdictionRuleset::builtin();
        let parsed = JurisdictionRuleset::from_json(&ruleset.to_json().unwrap()).unwrap();
        assert_eq!(parsed, ruleset);
    }

    #[test]
    fn test_json_normalizes_and_rejects_duplicates() {
        let json = r#"{"version": "1", "jurisdictions": {"gdpr": {"name": "REDACT"}}}"#;
        let ruleset = JurisdictionRuleset::from_json(json).unwrap();
        assert_eq!(
            ruleset.resolve_action(&["GDPR"], &Category::NAME).unwrap(),
            Action::Redact
        );

        let dup = r#"{"version": "1", "jurisdictions": {"gdpr": {}, "GDPR": {}}}"#;
        assert!(matches!(
            JurisdictionRuleset::from_json(dup),
            Err(RedactError::RulesetError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert!(JurisdictionRuleset::new("1").validate().is_err());
        assert!(JurisdictionRuleset::from_json(r#"{"version": "", "jurisdictions": {"X": {}}}"#).is_err());
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!("flag-only".parse::<Action>().unwrap(), Action::FlagOnly);
        assert_eq!(Action::Redact.to_string(), "REDACT");
        assert!("drop".parse::<Action>().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rulesets.json");
        let ruleset = JurisdictionRuleset::builtin();
        ruleset.save(&path).unwrap();
        assert_eq!(JurisdictionRuleset::load(&path).unwrap(), ruleset);
    }
}
