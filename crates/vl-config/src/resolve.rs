//! Configuration resolution and path discovery.
//!
//! Resolution order for each file: CLI argument → environment variable →
//! `VEIL_CONFIG_DIR` → XDG config directory → built-in defaults.

use crate::settings::SETTINGS_FILENAME;
use crate::{ConfigError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable names.
pub const ENV_SETTINGS_PATH: &str = "VEIL_SETTINGS";
pub const ENV_RULESETS_PATH: &str = "VEIL_RULESETS";
pub const ENV_CONFIG_DIR: &str = "VEIL_CONFIG_DIR";

/// Ruleset file name inside a config directory.
pub const RULESETS_FILENAME: &str = "rulesets.json";

/// Application name for XDG directories.
const APP_NAME: &str = "veil";

/// Where a configuration file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Configuration resolution options, usually filled from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    /// Explicit config directory.
    pub config_dir: Option<PathBuf>,
    /// Explicit settings file path.
    pub settings_path: Option<PathBuf>,
    /// Explicit ruleset file path.
    pub rulesets_path: Option<PathBuf>,
}

/// Discovered configuration file paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPaths {
    /// Path to settings.toml (or None if not found).
    pub settings: Option<PathBuf>,

    /// Path to rulesets.json (or None if not found).
    pub rulesets: Option<PathBuf>,

    pub settings_source: ConfigSource,
    pub rulesets_source: ConfigSource,
}

/// Resolve configuration paths from CLI options and the process environment.
pub fn resolve_config(options: &ConfigOptions) -> Result<ConfigPaths> {
    resolve_config_with(options, |name| std::env::var(name).ok(), dirs::config_dir())
}

/// Resolve configuration paths with an explicit environment lookup and XDG
/// base directory.
pub fn resolve_config_with<F>(
    options: &ConfigOptions,
    env: F,
    xdg_base: Option<PathBuf>,
) -> Result<ConfigPaths>
where
    F: Fn(&str) -> Option<String>,
{
    let xdg_dir = xdg_base.map(|d| d.join(APP_NAME));

    let (settings, settings_source) = resolve_single_config(
        options.settings_path.as_deref(),
        options.config_dir.as_deref(),
        &env,
        ENV_SETTINGS_PATH,
        SETTINGS_FILENAME,
        xdg_dir.as_deref(),
    )?;
    let (rulesets, rulesets_source) = resolve_single_config(
        options.rulesets_path.as_deref(),
        options.config_dir.as_deref(),
        &env,
        ENV_RULESETS_PATH,
        RULESETS_FILENAME,
        xdg_dir.as_deref(),
    )?;

    debug!(
        settings = ?settings,
        settings_source = %settings_source,
        rulesets = ?rulesets,
        rulesets_source = %rulesets_source,
        "Resolved config paths"
    );

    Ok(ConfigPaths {
        settings,
        rulesets,
        settings_source,
        rulesets_source,
    })
}

/// Resolve a single configuration file path.
///
/// An explicit file path that does not exist is an error; every other
/// location is optional.
fn resolve_single_config<F>(
    cli_path: Option<&Path>,
    cli_dir: Option<&Path>,
    env: &F,
    env_var: &str,
    filename: &str,
    xdg_dir: Option<&Path>,
) -> Result<(Option<PathBuf>, ConfigSource)>
where
    F: Fn(&str) -> Option<String>,
{
    // 1. CLI argument
    if let Some(path) = cli_path {
        if !path.is_file() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        return Ok((Some(path.to_path_buf()), ConfigSource::CliArgument));
    }
    if let Some(dir) = cli_dir {
        let path = dir.join(filename);
        if path.is_file() {
            return Ok((Some(path), ConfigSource::CliArgument));
        }
    }

    // 2. Environment variable (direct path)
    if let Some(env_path) = env(env_var) {
        let path = PathBuf::from(env_path);
        if !path.is_file() {
            return Err(ConfigError::NotFound { path });
        }
        return Ok((Some(path), ConfigSource::Environment));
    }

    // 3. Environment variable (config dir)
    if let Some(config_dir) = env(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(filename);
        if path.is_file() {
            return Ok((Some(path), ConfigSource::Environment));
        }
    }

    // 4. XDG config directory, skipped when a config dir was given explicitly
    if cli_dir.is_none() {
        if let Some(dir) = xdg_dir {
            let path = dir.join(filename);
            if path.is_file() {
                return Ok((Some(path), ConfigSource::XdgConfig));
            }
        }
    }

    // 5. Built-in default
    Ok((None, ConfigSource::BuiltinDefault))
}

/// Get the XDG config directory for veil.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}
