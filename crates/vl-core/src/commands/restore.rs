//! `veil restore`: reconstruct the original from a clean document and its
//! audit log.

use super::{emit_text, read_audit_log, read_clean_document, read_keys, CommandContext};
use crate::error::Result;
use crate::exit_codes::ExitCode;
use clap::Args;
use std::path::{Path, PathBuf};
use vl_redact::{AuditLog, CleanDocument, Document, RestoreEngine};

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Clean document produced by `veil redact`
    pub clean: PathBuf,

    /// Audit log written alongside the clean document
    #[arg(long)]
    pub audit: PathBuf,

    /// Write the original here instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Require a valid seal from a key in this key file
    #[arg(long)]
    pub seal_key: Option<PathBuf>,
}

pub fn run(_ctx: &CommandContext, args: &RestoreArgs) -> Result<ExitCode> {
    let clean = read_clean_document(&args.clean)?;
    let log = read_audit_log(&args.audit)?;
    let document = restore_checked(&clean, &log, args.seal_key.as_deref())?;

    emit_text(args.out.as_deref(), document.content())?;
    Ok(ExitCode::Clean)
}

/// Verify the seal when a key file is given, then restore.
pub(crate) fn restore_checked(
    clean: &CleanDocument,
    log: &AuditLog,
    key_file: Option<&Path>,
) -> Result<Document> {
    if let Some(path) = key_file {
        log.verify_seal_with(&read_keys(path)?)?;
    }
    Ok(RestoreEngine::new().restore(clean, log)?)
}
