//! Fuzz target for settings.toml parsing and validation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::Path;
use vl_config::{validate_settings, Settings};
use vl_redact::JurisdictionRuleset;

fuzz_target!(|data: &str| {
    if let Ok(settings) = Settings::from_toml(data, Path::new("fuzz.toml")) {
        let _ = validate_settings(&settings, &JurisdictionRuleset::builtin());
    }
});
