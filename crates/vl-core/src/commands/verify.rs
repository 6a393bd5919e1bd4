//! `veil verify`: check that a clean document and audit log belong together
//! and report original values still visible in the clean text.

use super::restore::restore_checked;
use super::{emit_json, read_audit_log, read_clean_document, review_code, CommandContext};
use crate::error::Result;
use crate::exit_codes::ExitCode;
use clap::Args;
use serde_json::json;
use std::path::PathBuf;
use tracing::warn;
use vl_redact::check_leaks;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Clean document produced by `veil redact`
    pub clean: PathBuf,

    /// Audit log written alongside the clean document
    #[arg(long)]
    pub audit: PathBuf,

    /// Also require a valid seal from a key in this key file
    #[arg(long)]
    pub seal_key: Option<PathBuf>,
}

/// Integrity failures are errors; leaked values exit with `Flagged`.
pub fn run(_ctx: &CommandContext, args: &VerifyArgs) -> Result<ExitCode> {
    let clean = read_clean_document(&args.clean)?;
    let log = read_audit_log(&args.audit)?;
    restore_checked(&clean, &log, args.seal_key.as_deref())?;

    let leaks = check_leaks(&clean, &log);
    if !leaks.is_clean() {
        warn!(
            leaked_values = leaks.leaked_values,
            critical = leaks.critical_count(),
            "Original values remain in the clean document"
        );
    }

    emit_json(
        None,
        &json!({
            "integrity": "ok",
            "documentHash": log.document_hash,
            "sealed": log.is_sealed(),
            "sealVerified": args.seal_key.is_some(),
            "summary": log.summary(),
            "leaks": leaks,
        }),
    )?;
    Ok(review_code(!leaks.is_clean()))
}
