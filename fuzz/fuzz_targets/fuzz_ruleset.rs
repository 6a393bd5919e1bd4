//! Fuzz target for rulesets.json parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use vl_redact::JurisdictionRuleset;

fuzz_target!(|data: &[u8]| {
    // Should never panic, only return an error
    let _ = serde_json::from_slice::<JurisdictionRuleset>(data);
});
