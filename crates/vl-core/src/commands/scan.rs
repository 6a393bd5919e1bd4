//! `veil scan`: detect and resolve spans, printing the redaction plan.

use super::{emit_json, read_text, review_code, start_session, CommandContext, DetectionArgs};
use crate::error::Result;
use crate::exit_codes::ExitCode;
use clap::Args;
use std::path::PathBuf;
use tracing::info;
use vl_redact::Document;

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Document to scan ("-" for stdin)
    pub input: PathBuf,

    #[command(flatten)]
    pub detection: DetectionArgs,

    /// Write the plan to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Exits with `Flagged` when any finding needs human review.
pub fn run(ctx: &CommandContext, args: &ScanArgs) -> Result<ExitCode> {
    let config = ctx.load_config()?;
    let session = start_session(&config, &args.detection.jurisdictions)?;
    let detectors = config.build_detectors(&args.detection.parsed_terms()?)?;

    let document = Document::new(read_text(&args.input)?);
    let report = session.scan(&document, &detectors)?;

    info!(
        document_hash = %report.document_hash,
        resolved = report.resolved_spans.len(),
        flagged = report.flagged_spans.len(),
        warnings = report.warnings.len(),
        "Scan complete"
    );

    emit_json(args.output.as_deref(), &report)?;
    Ok(review_code(report.has_flagged()))
}
