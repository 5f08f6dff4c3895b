//! CLI command implementations
//!
//! `exec` and `script` open the cluster named by the configuration, run
//! shell commands through the dispatcher, and write the cluster state back
//! after every command.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::read_script;
use crate::cluster::LocalCluster;
use crate::config::ShellConfig;
use crate::observability::{
    log_event_with_fields, AuditLog, Event, FileAuditLog, Logger, NullAuditLog, Severity,
};
use crate::shell::{
    AssumeYes, CommandDispatcher, CommandGroup, CommandRegistry, Confirmer, ConsoleConfirmer,
    Session,
};

/// Parse arguments and run
pub fn run() -> CliResult<()> {
    run_command(Cli::parse_args())
}

pub fn run_command(cli: Cli) -> CliResult<()> {
    if cli.debug {
        Logger::set_min_severity(Severity::Trace);
    }
    match cli.command {
        Command::Init {
            secure,
            state,
            force,
        } => init(&cli.config, &state, secure, force),
        Command::Exec { command, args } => exec(&cli.config, cli.debug, cli.yes, &command, &args),
        Command::Script { file } => script(&cli.config, cli.debug, cli.yes, &file),
        Command::Commands { group } => list_commands(group.as_deref()),
        Command::Help { command } => help(&command),
    }
}

/// Write a configuration file and a fresh cluster state beside it.
///
/// With `secure` the cluster state includes the access-control table.
pub fn init(config_path: &Path, state: &Path, secure: bool, force: bool) -> CliResult<()> {
    if config_path.exists() && !force {
        return Err(CliError::already_initialized(&config_path.display().to_string()));
    }

    let config = ShellConfig::for_state(state);
    config.validate()?;
    let resolved = config.clone().resolve_paths(config_path);

    if let Some(dir) = config_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| {
            CliError::config_error(format!("Failed to create directory {:?}: {}", dir, e))
        })?;
    }

    let cluster = if secure {
        LocalCluster::new().with_acl_table(resolved.acl_table.as_str()).secured()
    } else {
        LocalCluster::new()
    };
    save_state(&cluster, &resolved.cluster_state)?;
    config.save(config_path)?;

    let mut stdout = io::stdout().lock();
    writeln!(
        stdout,
        "Initialized {} (cluster state {}{})",
        config_path.display(),
        resolved.cluster_state.display(),
        if secure { ", access control enabled" } else { "" }
    )?;
    Ok(())
}

/// Run one shell command.
pub fn exec(config_path: &Path, debug: bool, yes: bool, name: &str, args: &[String]) -> CliResult<()> {
    let mut shell = Shell::open(config_path, debug, yes)?;
    if shell.run(name, args)? {
        Ok(())
    } else {
        Err(CliError::command_failed(1, 1))
    }
}

/// Run every command in `file`. A failing line does not stop the script;
/// the result is an error when any line failed.
pub fn script(config_path: &Path, debug: bool, yes: bool, file: &Path) -> CliResult<()> {
    let lines = read_script(file)?;
    let mut shell = Shell::open(config_path, debug, yes)?;

    let mut failed = 0;
    for line in &lines {
        if !shell.run(&line.command, &line.args)? {
            failed += 1;
            log_event_with_fields(
                Event::ScriptLineFailed,
                &[
                    ("line", line.number.to_string().as_str()),
                    ("command", line.command.as_str()),
                ],
            );
        }
    }

    if failed > 0 {
        return Err(CliError::command_failed(failed, lines.len()));
    }
    Ok(())
}

/// Print command names by group.
pub fn list_commands(group: Option<&str>) -> CliResult<()> {
    let groups = match group {
        Some(name) => vec![CommandGroup::parse(name).ok_or_else(|| CliError::unknown_group(name))?],
        None => CommandGroup::ALL.to_vec(),
    };

    let registry = CommandRegistry::standard();
    let mut stdout = io::stdout().lock();
    for group in groups {
        let names: Vec<&str> = registry.in_group(group).iter().map(|c| c.name).collect();
        writeln!(stdout, "  Group name: {}", group)?;
        writeln!(stdout, "  Commands: {}", names.join(", "))?;
        writeln!(stdout)?;
    }
    Ok(())
}

/// Print one command's usage and description.
pub fn help(name: &str) -> CliResult<()> {
    let command = CommandRegistry::standard()
        .lookup(name)
        .ok_or_else(|| CliError::unknown_command(name))?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", command.help_text())?;
    Ok(())
}

/// A session bound to a loaded cluster state file.
struct Shell {
    cluster: LocalCluster,
    config: ShellConfig,
    session: Session,
    dispatcher: CommandDispatcher,
}

impl Shell {
    fn open(config_path: &Path, debug: bool, yes: bool) -> CliResult<Self> {
        let mut config = ShellConfig::load(config_path)?.resolve_paths(config_path);
        config.debug |= debug;
        if config.debug {
            Logger::set_min_severity(Severity::Trace);
        }
        log_event_with_fields(
            Event::ConfigLoaded,
            &[("path", config_path.display().to_string().as_str())],
        );

        let cluster = connect(&config)?;

        let audit: Arc<dyn AuditLog> = match &config.audit_log {
            Some(path) => Arc::new(FileAuditLog::open(path).map_err(|e| {
                CliError::io_error(format!("Failed to open audit log {}: {}", path.display(), e))
            })?),
            None => Arc::new(NullAuditLog),
        };
        let confirmer: Box<dyn Confirmer> = if yes {
            Box::new(AssumeYes)
        } else {
            Box::new(ConsoleConfirmer::stdio())
        };

        let session = Session::new(Arc::new(cluster.clone()))
            .with_config(config.clone())
            .with_confirmer(confirmer)
            .with_audit_log(audit);

        Ok(Self {
            cluster,
            config,
            session,
            dispatcher: CommandDispatcher::default(),
        })
    }

    /// Run, render and persist. Returns whether the command succeeded.
    fn run(&mut self, name: &str, args: &[String]) -> CliResult<bool> {
        let result = self.dispatcher.run(&mut self.session, name, args)?;
        save_state(&self.cluster, &self.config.cluster_state)?;
        Ok(result.is_success())
    }
}

/// Load the cluster state, trying `connection_attempts` times.
fn connect(config: &ShellConfig) -> CliResult<LocalCluster> {
    let path = config.cluster_state.display().to_string();
    let mut last_error = String::new();

    for attempt in 1..=config.connection_attempts {
        match LocalCluster::load(&config.cluster_state) {
            Ok(cluster) => {
                log_event_with_fields(
                    Event::ConnectionOpened,
                    &[("state", path.as_str()), ("attempt", attempt.to_string().as_str())],
                );
                return Ok(cluster.with_acl_table(config.acl_table.as_str()));
            }
            Err(e) => {
                last_error = e.to_string();
                log_event_with_fields(
                    Event::ConnectionAttemptFailed,
                    &[
                        ("state", path.as_str()),
                        ("attempt", attempt.to_string().as_str()),
                        ("error", last_error.as_str()),
                    ],
                );
            }
        }
    }

    Err(CliError::connection_failed(format!(
        "Could not open cluster state {} after {} attempt(s): {}",
        path, config.connection_attempts, last_error
    )))
}

fn save_state(cluster: &LocalCluster, path: &Path) -> CliResult<()> {
    cluster
        .save(path)
        .map_err(|e| CliError::io_error(e.to_string()))?;
    log_event_with_fields(
        Event::ClusterStateSaved,
        &[("state", path.display().to_string().as_str())],
    );
    Ok(())
}
