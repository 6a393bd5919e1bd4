//! `veil bundle`: package redaction artifacts for handoff, and verify
//! received bundles.

use super::{emit_json, emit_text, read_audit_log, read_clean_document, CommandContext};
use crate::error::{CliError, Result};
use crate::exit_codes::ExitCode;
use clap::{Args, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use tracing::warn;
use vl_bundle::{BundleReader, BundleWriter, ExportProfile};
use vl_redact::RestoreEngine;

#[derive(Args, Debug)]
pub struct BundleArgs {
    #[command(subcommand)]
    pub command: BundleCommand,
}

#[derive(Subcommand, Debug)]
pub enum BundleCommand {
    /// Package a clean document (and, for local bundles, its audit log)
    Create(BundleCreateArgs),
    /// Verify every checksum and print the manifest
    Inspect(BundleInspectArgs),
}

#[derive(Args, Debug)]
pub struct BundleCreateArgs {
    /// Clean document produced by `veil redact`
    #[arg(long)]
    pub clean: PathBuf,

    /// Audit log matching the clean document
    #[arg(long)]
    pub audit: PathBuf,

    /// Export profile: local (includes the audit log) or shareable
    #[arg(long, default_value = "local")]
    pub profile: String,

    /// Bundle file to write
    #[arg(short, long)]
    pub output: PathBuf,

    /// Free-form note stored in the manifest
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Debug)]
pub struct BundleInspectArgs {
    /// Bundle file to inspect
    pub bundle: PathBuf,

    /// Restore the original from a local bundle into this file
    #[arg(long)]
    pub restore_to: Option<PathBuf>,
}

pub fn run(ctx: &CommandContext, args: &BundleArgs) -> Result<ExitCode> {
    match &args.command {
        BundleCommand::Create(args) => create(ctx, args),
        BundleCommand::Inspect(args) => inspect(ctx, args),
    }
}

fn create(_ctx: &CommandContext, args: &BundleCreateArgs) -> Result<ExitCode> {
    let profile: ExportProfile = args.profile.parse()?;
    let clean = read_clean_document(&args.clean)?;
    let log = read_audit_log(&args.audit)?;

    let mut writer = BundleWriter::for_redaction(profile, &clean, &log)?
        .with_tool_version(env!("CARGO_PKG_VERSION"));
    if let Some(description) = &args.description {
        writer = writer.with_description(description);
    }
    let manifest = writer.write(&args.output)?;

    emit_json(None, &manifest)?;
    Ok(ExitCode::Clean)
}

fn inspect(_ctx: &CommandContext, args: &BundleInspectArgs) -> Result<ExitCode> {
    let mut reader = BundleReader::open(&args.bundle)?;
    let failures = reader.verify_all();

    emit_json(
        None,
        &json!({
            "manifest": reader.manifest(),
            "verified": failures.is_empty(),
            "failures": failures,
        }),
    )?;

    if !failures.is_empty() {
        warn!(failures = failures.len(), "Bundle failed verification");
        return Ok(ExitCode::IntegrityError);
    }

    if let Some(path) = &args.restore_to {
        let clean = reader.read_clean_document()?;
        let log = reader.read_audit_log()?.ok_or_else(|| {
            CliError::Args(format!(
                "{} bundles carry no audit log and cannot be restored",
                reader.export_profile()
            ))
        })?;
        let document = RestoreEngine::new().restore(&clean, &log)?;
        emit_text(Some(path), document.content())?;
    }

    Ok(ExitCode::Clean)
}
