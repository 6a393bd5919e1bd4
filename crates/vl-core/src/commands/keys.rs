//! `veil keys`: manage audit-log seal key files.

use super::{emit_json, read_keys, CommandContext};
use crate::error::{CliError, Result};
use crate::exit_codes::ExitCode;
use clap::{Args, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;
use vl_redact::KeyManager;

#[derive(Args, Debug)]
pub struct KeysArgs {
    #[command(subcommand)]
    pub command: KeysCommand,
}

#[derive(Subcommand, Debug)]
pub enum KeysCommand {
    /// Create a key file with one fresh key
    Init {
        /// Key file to create
        path: PathBuf,

        /// Overwrite an existing key file
        #[arg(long)]
        force: bool,
    },
    /// Add a new active key; older keys stay available for verification
    Rotate {
        /// Key file to update
        path: PathBuf,
    },
}

pub fn run(_ctx: &CommandContext, args: &KeysArgs) -> Result<ExitCode> {
    let (path, keys) = match &args.command {
        KeysCommand::Init { path, force } => {
            if path.exists() && !force {
                return Err(CliError::Args(format!(
                    "{} already exists; pass --force to replace it",
                    path.display()
                )));
            }
            let keys = KeyManager::new()?;
            keys.save(path)?;
            info!(path = %path.display(), "Created key file");
            (path, keys)
        }
        KeysCommand::Rotate { path } => {
            let mut keys = read_keys(path)?;
            keys.rotate()?;
            keys.save(path)?;
            info!(path = %path.display(), active_key_id = %keys.active_key_id, "Rotated seal key");
            (path, keys)
        }
    };

    emit_json(
        None,
        &json!({
            "path": path.display().to_string(),
            "activeKeyId": keys.active_key_id,
            "keyCount": keys.keys.len(),
        }),
    )?;
    Ok(ExitCode::Clean)
}
