//! Veil command line library.
//!
//! Hosts everything the `veil` binary needs so it can be tested in-process:
//! - `commands`: one module per subcommand
//! - `exit_codes`: the stable exit code contract
//! - `logging`: tracing-subscriber setup (stderr, human or JSONL)
//! - `error`: the CLI error type and its exit code mapping

pub mod commands;
pub mod error;
pub mod exit_codes;
pub mod logging;

pub use error::{CliError, Result};
pub use exit_codes::ExitCode;
