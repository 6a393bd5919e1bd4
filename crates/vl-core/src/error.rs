//! CLI error type.
//!
//! Wraps every library error so commands can use `?` freely; the binary maps
//! the error to an [`ExitCode`] and prints a single `error:` line.

use crate::exit_codes::ExitCode;
use std::path::PathBuf;
use thiserror::Error;
use vl_bundle::BundleError;
use vl_config::ConfigError;
use vl_redact::RedactError;

/// Result type for CLI commands.
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Args(String),

    #[error("invalid plan {path}: {message}")]
    InvalidPlan { path: PathBuf, message: String },

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Redact(#[from] RedactError),

    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Exit code reported for this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Args(_) => ExitCode::ArgsError,
            CliError::InvalidPlan { .. } => ExitCode::InvalidPlan,
            CliError::Read { .. } | CliError::Write { .. } => ExitCode::IoError,
            CliError::Config(e) => ExitCode::from(e),
            CliError::Redact(e) => ExitCode::from(e),
            CliError::Bundle(e) => ExitCode::from(e),
            CliError::Json(_) => ExitCode::InternalError,
        }
    }
}
