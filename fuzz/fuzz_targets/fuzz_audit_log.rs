//! Fuzz target for audit log parsing and validation.

#![no_main]

use libfuzzer_sys::fuzz_target;
use vl_redact::AuditLog;

fuzz_target!(|data: &str| {
    if let Ok(log) = AuditLog::from_json(data) {
        let _ = log.summary();
    }
});
