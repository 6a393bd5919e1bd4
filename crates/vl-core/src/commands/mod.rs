//! Subcommand implementations.
//!
//! Each command returns the [`ExitCode`] for its operational outcome; errors
//! carry their own exit code through [`CliError::exit_code`].

pub mod bundle;
pub mod keys;
pub mod redact;
pub mod restore;
pub mod rulesets;
pub mod scan;
pub mod verify;

use crate::error::{CliError, Result};
use crate::exit_codes::ExitCode;
use clap::Args;
use serde::Serialize;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::warn;
use vl_config::{load_config, ConfigOptions, LoadedConfig};
use vl_redact::{AuditLog, Category, CleanDocument, KeyManager, RedactionSession};

/// State shared by all commands.
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    pub config_options: ConfigOptions,
}

impl CommandContext {
    pub fn new(config_options: ConfigOptions) -> Self {
        Self { config_options }
    }

    pub fn load_config(&self) -> Result<LoadedConfig> {
        Ok(load_config(&self.config_options)?)
    }
}

/// Detection options shared by `scan` and `redact`.
#[derive(Args, Debug, Clone, Default)]
pub struct DetectionArgs {
    /// Active jurisdictions, comma separated (defaults to settings)
    #[arg(short = 'j', long = "jurisdiction", value_delimiter = ',')]
    pub jurisdictions: Vec<String>,

    /// Extra dictionary term, e.g. --term NAME="John Doe"
    #[arg(long = "term", value_name = "CATEGORY=VALUE")]
    pub terms: Vec<String>,
}

impl DetectionArgs {
    /// Parse `--term` values.
    pub fn parsed_terms(&self) -> Result<Vec<(Category, String)>> {
        self.terms.iter().map(|raw| parse_term(raw)).collect()
    }
}

/// Parse a `CATEGORY=value` term.
pub fn parse_term(raw: &str) -> Result<(Category, String)> {
    let (category, value) = raw
        .split_once('=')
        .ok_or_else(|| CliError::Args(format!("term '{}' is not CATEGORY=VALUE", raw)))?;
    if value.trim().is_empty() {
        return Err(CliError::Args(format!("term '{}' has an empty value", raw)));
    }
    let category = Category::new(category)
        .map_err(|_| CliError::Args(format!("term '{}' has an invalid category", raw)))?;
    Ok((category, value.to_string()))
}

/// Start a session for `jurisdictions`, falling back to the configured set.
pub fn start_session(config: &LoadedConfig, jurisdictions: &[String]) -> Result<RedactionSession> {
    if jurisdictions.is_empty() && config.settings.jurisdictions.is_empty() {
        return Err(CliError::Args(
            "no jurisdictions selected; pass -j or set jurisdictions in settings.toml".to_string(),
        ));
    }
    Ok(config.session(jurisdictions)?)
}

/// Read a UTF-8 text file; `-` reads stdin.
pub fn read_text(path: &Path) -> Result<String> {
    let mut text = String::new();
    let read = if path == Path::new("-") {
        std::io::stdin().read_to_string(&mut text)
    } else {
        std::fs::File::open(path).and_then(|mut f| f.read_to_string(&mut text))
    };
    read.map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(text)
}

/// Write text to a file.
pub fn write_text(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write several files so that either all of them land or none do.
///
/// Each file is staged next to its target and renamed into place only once
/// every file has been staged.
pub fn write_all_or_nothing(files: &[(&Path, &str)]) -> Result<()> {
    let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(files.len());
    for (path, text) in files {
        let tmp_path = staging_path(path);
        if let Err(e) = write_text(&tmp_path, text) {
            discard(staged.iter().map(|(tmp, _)| tmp.as_path()));
            return Err(e);
        }
        staged.push((tmp_path, *path));
    }

    for (index, (tmp_path, path)) in staged.iter().enumerate() {
        if let Err(source) = std::fs::rename(tmp_path, path) {
            warn!(path = %path.display(), error = %source, "Rename failed, discarding outputs");
            discard(staged[..index].iter().map(|(_, path)| *path));
            discard(staged[index..].iter().map(|(tmp, _)| tmp.as_path()));
            return Err(CliError::Write {
                path: path.to_path_buf(),
                source,
            });
        }
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    path.with_file_name(format!(".{}.tmp.{}", file_name, std::process::id()))
}

fn discard<'a>(paths: impl Iterator<Item = &'a Path>) {
    for path in paths {
        let _ = std::fs::remove_file(path);
    }
}

/// Write text to `path`, or to stdout without a trailing newline.
pub fn emit_text(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => write_text(path, text),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .and_then(|_| stdout.flush())
                .map_err(|source| CliError::Write {
                    path: PathBuf::from("<stdout>"),
                    source,
                })
        }
    }
}

/// Pretty JSON to `path`, or to stdout.
pub fn emit_json<T: Serialize>(path: Option<&Path>, value: &T) -> Result<()> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    emit_text(path, &json)
}

/// Load an audit log, keeping the path in I/O errors.
pub fn read_audit_log(path: &Path) -> Result<AuditLog> {
    Ok(AuditLog::from_json(&read_text(path)?)?)
}

/// Load a clean document; its hash is taken from the text as received.
pub fn read_clean_document(path: &Path) -> Result<CleanDocument> {
    Ok(CleanDocument::from_text(read_text(path)?))
}

/// Load a seal key file.
pub fn read_keys(path: &Path) -> Result<KeyManager> {
    if !path.is_file() {
        return Err(CliError::Read {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "key file not found"),
        });
    }
    Ok(KeyManager::load(path)?)
}

/// Exit code for an operation that may leave findings to review.
pub(crate) fn review_code(needs_review: bool) -> ExitCode {
    if needs_review {
        ExitCode::Flagged
    } else {
        ExitCode::Clean
    }
}
