//! Loading settings and rulesets into ready-to-use engine inputs.

use crate::resolve::{resolve_config, ConfigOptions, ConfigPaths};
use crate::settings::Settings;
use crate::validate::validate_settings;
use crate::{ConfigError, Result};
use std::sync::Arc;
use tracing::{debug, info};
use vl_redact::{
    AllocatorOptions, Category, Detector, DetectorPriority, DictionaryDetector,
    JurisdictionRuleset, PatternDetector, PatternRule, RedactionSession,
};

/// Resolved configuration with provenance information.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub settings: Settings,
    pub ruleset: Arc<JurisdictionRuleset>,
    pub paths: ConfigPaths,
}

/// Load configuration with the standard resolution order and validate it.
pub fn load_config(options: &ConfigOptions) -> Result<LoadedConfig> {
    let paths = resolve_config(options)?;
    load_from_paths(paths)
}

/// Load configuration from already-resolved paths.
pub fn load_from_paths(paths: ConfigPaths) -> Result<LoadedConfig> {
    let settings = match &paths.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let ruleset = match &paths.rulesets {
        Some(path) => JurisdictionRuleset::load(path).map_err(|source| ConfigError::Ruleset {
            path: path.clone(),
            source,
        })?,
        None => JurisdictionRuleset::builtin(),
    };

    let issues = validate_settings(&settings, &ruleset);
    if !issues.is_empty() {
        return Err(ConfigError::Invalid(issues));
    }

    info!(
        settings_source = %paths.settings_source,
        rulesets_source = %paths.rulesets_source,
        ruleset_version = ruleset.version(),
        "Configuration loaded"
    );

    Ok(LoadedConfig {
        settings,
        ruleset: Arc::new(ruleset),
        paths,
    })
}

impl LoadedConfig {
    /// Builtin defaults with no files involved.
    pub fn builtin() -> Self {
        Self {
            settings: Settings::default(),
            ruleset: Arc::new(JurisdictionRuleset::builtin()),
            paths: ConfigPaths::default(),
        }
    }

    /// Build the detector set: the pattern detector, then the dictionary
    /// detector if any terms are configured.
    ///
    /// `extra_terms` are appended to the dictionary (e.g. from `--term`).
    pub fn build_detectors(&self, extra_terms: &[(Category, String)]) -> Result<Vec<Box<dyn Detector>>> {
        let mut pattern = if self.settings.disable_builtin_patterns {
            PatternDetector::empty(PatternDetector::DEFAULT_ID)
        } else {
            PatternDetector::new()
        };
        for custom in &self.settings.custom_patterns {
            let category = Category::new(&custom.category)?;
            pattern.add_rule(PatternRule::new(
                custom.name.clone(),
                category,
                &custom.pattern,
                custom.confidence,
            )?);
        }

        let mut dictionary = DictionaryDetector::new();
        for entry in &self.settings.dictionary {
            let category = Category::new(&entry.category)?;
            dictionary.add_terms(category, &entry.terms, entry.case_insensitive)?;
        }
        for (category, term) in extra_terms {
            dictionary.add_terms(category.clone(), [term], false)?;
        }

        let mut detectors: Vec<Box<dyn Detector>> = Vec::new();
        if !pattern.rules().is_empty() {
            detectors.push(Box::new(pattern));
        }
        if !dictionary.is_empty() {
            detectors.push(Box::new(dictionary));
        }
        debug!(count = detectors.len(), "Built detectors");
        Ok(detectors)
    }

    /// Start a redaction session.
    ///
    /// `jurisdictions` overrides the configured set when non-empty.
    pub fn session<S: AsRef<str>>(&self, jurisdictions: &[S]) -> Result<RedactionSession> {
        let session = if jurisdictions.is_empty() {
            RedactionSession::new(self.ruleset.clone(), self.settings.jurisdictions.as_slice())?
        } else {
            RedactionSession::new(self.ruleset.clone(), jurisdictions)?
        };
        Ok(session
            .with_priority(DetectorPriority::new(self.settings.detector_priority.iter().cloned()))
            .with_allocator_options(AllocatorOptions {
                dedupe_values: self.settings.dedupe_values,
            }))
    }
}
