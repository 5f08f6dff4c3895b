//! CLI module for colshell
//!
//! Provides command-line interface for:
//! - init: Write a configuration and a fresh cluster state
//! - exec: Run one shell command
//! - script: Run shell commands from a file
//! - commands / help: Browse the command registry

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{exec, help, init, list_commands, run, run_command, script};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{parse_script, read_script, tokenize, ScriptLine};
