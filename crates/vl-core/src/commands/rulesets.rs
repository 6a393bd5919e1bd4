//! `veil rulesets`: print the effective jurisdiction ruleset.

use super::{emit_json, emit_text, CommandContext};
use crate::error::Result;
use crate::exit_codes::ExitCode;
use clap::Args;
use serde_json::json;
use vl_redact::ruleset::normalize_tag;
use vl_redact::RedactError;

#[derive(Args, Debug)]
pub struct RulesetsArgs {
    /// Show only this jurisdiction's table
    #[arg(short = 'j', long = "jurisdiction")]
    pub jurisdiction: Option<String>,
}

pub fn run(ctx: &CommandContext, args: &RulesetsArgs) -> Result<ExitCode> {
    let config = ctx.load_config()?;
    let ruleset = &config.ruleset;

    match &args.jurisdiction {
        Some(tag) => {
            let rules = ruleset
                .rules_for(tag)
                .ok_or_else(|| RedactError::UnknownJurisdiction(tag.clone()))?;
            emit_json(
                None,
                &json!({
                    "version": ruleset.version(),
                    "source": config.paths.rulesets_source.to_string(),
                    "jurisdiction": normalize_tag(tag),
                    "rules": rules,
                }),
            )?;
        }
        None => {
            let mut json = ruleset.to_json()?;
            json.push('\n');
            emit_text(None, &json)?;
        }
    }
    Ok(ExitCode::Clean)
}
