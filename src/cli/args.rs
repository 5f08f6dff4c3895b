//! CLI argument definitions using clap
//!
//! Commands:
//! - colshell init [--secure]
//! - colshell exec <command> [args...]
//! - colshell script <file>
//! - colshell commands [group]
//! - colshell help <command>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// colshell - administrative shell for a column-oriented table store
#[derive(Parser, Debug)]
#[command(name = "colshell")]
#[command(version, about, long_about = None)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = "./colshell.json")]
    pub config: PathBuf,

    /// Log at trace level and show backtraces for unclassified errors
    #[arg(long, global = true)]
    pub debug: bool,

    /// Answer yes to every confirmation prompt
    #[arg(long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a configuration file and a fresh cluster state
    Init {
        /// Create the access-control table
        #[arg(long)]
        secure: bool,

        /// Cluster state file, relative to the configuration file
        #[arg(long, default_value = "colshell-state.json")]
        state: PathBuf,

        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Run one shell command
    Exec {
        /// Command name, e.g. list or grant
        command: String,

        /// Positional arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Run shell commands from a file, one per line
    Script {
        file: PathBuf,
    },

    /// List shell commands, optionally one group only
    Commands {
        group: Option<String>,
    },

    /// Show help for a shell command
    Help {
        command: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_collects_arguments() {
        let cli = Cli::try_parse_from(["colshell", "--yes", "exec", "grant", "bob", "RW", "t1"]).unwrap();
        assert!(cli.yes);
        match cli.command {
            Command::Exec { command, args } => {
                assert_eq!(command, "grant");
                assert_eq!(args, vec!["bob", "RW", "t1"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["colshell", "init", "--secure", "--config", "/tmp/c.json"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("/tmp/c.json"));
        assert!(matches!(cli.command, Command::Init { secure: true, .. }));
    }

    #[test]
    fn test_help_is_a_shell_command() {
        let cli = Cli::try_parse_from(["colshell", "help", "drop_all"]).unwrap();
        assert!(matches!(cli.command, Command::Help { command } if command == "drop_all"));
    }
}
