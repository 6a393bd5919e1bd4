//! `veil redact`: replace approved spans and write the clean document and
//! audit log.

use super::{
    emit_json, read_keys, read_text, start_session, write_all_or_nothing, CommandContext,
    DetectionArgs,
};
use crate::error::{CliError, Result};
use crate::exit_codes::ExitCode;
use clap::Args;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;
use vl_redact::{Document, ScanReport};

#[derive(Args, Debug)]
pub struct RedactArgs {
    /// Document to redact ("-" for stdin)
    pub input: PathBuf,

    #[command(flatten)]
    pub detection: DetectionArgs,

    /// Reviewed plan from `veil scan`; without it every resolved span is approved
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Where to write the clean document
    #[arg(long)]
    pub out: PathBuf,

    /// Where to write the audit log
    #[arg(long)]
    pub audit: PathBuf,

    /// Seal the audit log with the active key from this key file
    #[arg(long)]
    pub seal_key: Option<PathBuf>,
}

pub fn run(ctx: &CommandContext, args: &RedactArgs) -> Result<ExitCode> {
    let config = ctx.load_config()?;
    let document = Document::new(read_text(&args.input)?);

    let plan = match &args.plan {
        Some(path) => Some(read_plan(path)?),
        None => None,
    };

    // A reviewed plan carries the jurisdictions it was made under.
    let jurisdictions = match &plan {
        Some(plan) if args.detection.jurisdictions.is_empty() => plan.jurisdictions.clone(),
        _ => args.detection.jurisdictions.clone(),
    };
    let mut session = start_session(&config, &jurisdictions)?;
    if let Some(path) = &args.seal_key {
        session = session.with_seal_key(read_keys(path)?.active_key()?);
    }

    let redaction = match &plan {
        Some(plan) => session.redact_plan(&document, plan)?,
        None => {
            let detectors = config.build_detectors(&args.detection.parsed_terms()?)?;
            let report = session.scan(&document, &detectors)?;
            session.redact(&document, &report.resolved_spans)?
        }
    };

    let log = &redaction.audit_log;
    let audit_json = log.to_json()?;
    write_all_or_nothing(&[
        (args.out.as_path(), redaction.clean_document.content()),
        (args.audit.as_path(), audit_json.as_str()),
    ])?;
    info!(
        clean = %args.out.display(),
        audit = %args.audit.display(),
        mappings = log.mappings.len(),
        "Wrote redaction artifacts"
    );

    emit_json(
        None,
        &json!({
            "documentHash": log.document_hash,
            "cleanDocumentHash": log.clean_document_hash,
            "rulesetVersion": log.ruleset_version,
            "sealed": log.is_sealed(),
            "summary": log.summary(),
        }),
    )?;
    Ok(ExitCode::Clean)
}

fn read_plan(path: &std::path::Path) -> Result<ScanReport> {
    serde_json::from_str(&read_text(path)?).map_err(|e| CliError::InvalidPlan {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
