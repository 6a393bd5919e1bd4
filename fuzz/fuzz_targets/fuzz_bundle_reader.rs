//! Fuzz target for export bundle reading.
//!
//! Bundles arrive from other machines, so opening and verifying one must
//! return errors, never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use vl_bundle::BundleReader;

fuzz_target!(|data: &[u8]| {
    if let Ok(mut reader) = BundleReader::from_bytes(data.to_vec()) {
        let _ = reader.verify_all();
        let _ = reader.read_clean_document();
        let _ = reader.read_audit_log();
    }
});
