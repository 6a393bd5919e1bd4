//! Veil - deterministic, reversible document redaction.
//!
//! The main entry point for the `veil` CLI, handling:
//! - Scanning documents into reviewable redaction plans
//! - Redacting approved spans with an audit log
//! - Restoring and verifying clean documents
//! - Export bundles and seal key management

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use vl_config::ConfigOptions;
use vl_core::commands::bundle::BundleArgs;
use vl_core::commands::keys::KeysArgs;
use vl_core::commands::redact::RedactArgs;
use vl_core::commands::restore::RestoreArgs;
use vl_core::commands::rulesets::RulesetsArgs;
use vl_core::commands::scan::ScanArgs;
use vl_core::commands::verify::VerifyArgs;
use vl_core::commands::{self, CommandContext};
use vl_core::exit_codes::ExitCode;
use vl_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};

/// Veil - redact sensitive spans, restore them exactly when authorized
#[derive(Parser)]
#[command(name = "veil")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Override config directory
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Settings file (overrides config directory lookup)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Ruleset file (overrides config directory lookup)
    #[arg(long, global = true)]
    rulesets: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error, off
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format: human or jsonl
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect sensitive spans and print a reviewable plan
    Scan(ScanArgs),

    /// Replace approved spans with placeholders and write an audit log
    Redact(RedactArgs),

    /// Reconstruct the original document from clean text and audit log
    Restore(RestoreArgs),

    /// Check integrity and report values still visible in clean text
    Verify(VerifyArgs),

    /// Create or inspect export bundles
    Bundle(BundleArgs),

    /// Manage audit-log seal keys
    Keys(KeysArgs),

    /// Print the effective jurisdiction ruleset
    Rulesets(RulesetsArgs),
}

impl GlobalOpts {
    fn log_level(&self) -> Option<LogLevel> {
        if self.quiet {
            Some(LogLevel::Error)
        } else if self.verbose > 0 {
            Some(self.log_level.unwrap_or_default().more_verbose(self.verbose))
        } else {
            self.log_level
        }
    }

    fn config_options(&self) -> ConfigOptions {
        ConfigOptions {
            config_dir: self.config_dir.clone(),
            settings_path: self.settings.clone(),
            rulesets_path: self.rulesets.clone(),
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            std::process::exit(code.as_i32());
        }
    };

    let log_config = LogConfig::from_env(cli.global.log_level(), cli.global.log_format);
    init_logging(&log_config);

    let ctx = CommandContext::new(cli.global.config_options());
    let result = match &cli.command {
        Commands::Scan(args) => commands::scan::run(&ctx, args),
        Commands::Redact(args) => commands::redact::run(&ctx, args),
        Commands::Restore(args) => commands::restore::run(&ctx, args),
        Commands::Verify(args) => commands::verify::run(&ctx, args),
        Commands::Bundle(args) => commands::bundle::run(&ctx, args),
        Commands::Keys(args) => commands::keys::run(&ctx, args),
        Commands::Rulesets(args) => commands::rulesets::run(&ctx, args),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            let code = e.exit_code();
            tracing::debug!(code = %code, "Command failed");
            eprintln!("error: {}", e);
            code
        }
    };

    std::process::exit(exit_code.as_i32());
}
