//! CLI tests
//!
//! `init`, `exec` and `script` against a state file in a temporary
//! directory.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use colshell::cli::{self, CliErrorCode};
use colshell::cluster::{Admin, LocalCluster};
use colshell::config::ShellConfig;

fn initialized(secure: bool) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("colshell.json");
    cli::init(&config, Path::new("state.json"), secure, false).unwrap();
    (dir, config)
}

fn exec(config: &Path, name: &str, args: &[&str]) -> cli::CliResult<()> {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    cli::exec(config, false, true, name, &args)
}

fn load_state(dir: &TempDir) -> LocalCluster {
    LocalCluster::load(&dir.path().join("state.json")).unwrap()
}

// =============================================================================
// INIT
// =============================================================================

#[test]
fn test_init_writes_config_and_state() {
    let (dir, config) = initialized(false);

    let loaded = ShellConfig::load(&config).unwrap();
    assert_eq!(loaded.cluster_state, PathBuf::from("state.json"));
    assert!(dir.path().join("state.json").exists());
    assert!(load_state(&dir).list_tables().unwrap().is_empty());
}

#[test]
fn test_init_refuses_to_overwrite_without_force() {
    let (_dir, config) = initialized(false);

    let err = cli::init(&config, Path::new("state.json"), false, false).unwrap_err();
    assert_eq!(err.code(), &CliErrorCode::AlreadyInitialized);

    cli::init(&config, Path::new("state.json"), true, true).unwrap();
}

#[test]
fn test_secure_init_creates_acl_table() {
    let (dir, _config) = initialized(true);
    let cluster = load_state(&dir);
    assert!(cluster.table_exists("system:acl").unwrap());
}

// =============================================================================
// EXEC
// =============================================================================

#[test]
fn test_exec_persists_state_between_invocations() {
    let (dir, config) = initialized(false);

    exec(&config, "create", &["t1", "cf"]).unwrap();
    exec(&config, "put", &["t1", "r1", "cf:a", "v"]).unwrap();

    let cluster = load_state(&dir);
    assert_eq!(cluster.list_tables().unwrap(), vec!["t1".to_string()]);
    assert_eq!(cluster.state().tables["t1"].rows.len(), 1);
}

#[test]
fn test_exec_failure_is_command_failed() {
    let (_dir, config) = initialized(false);

    let err = exec(&config, "drop", &["missing"]).unwrap_err();
    assert_eq!(err.code(), &CliErrorCode::CommandFailed);
    assert_eq!(err.code_str(), "COLSHELL_CLI_COMMAND_FAILED");
}

#[test]
fn test_exec_without_config_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = exec(&dir.path().join("absent.json"), "status", &[]).unwrap_err();
    assert_eq!(err.code(), &CliErrorCode::ConfigError);
}

#[test]
fn test_missing_state_fails_to_connect() {
    let (dir, config) = initialized(false);
    fs::remove_file(dir.path().join("state.json")).unwrap();

    let err = exec(&config, "status", &[]).unwrap_err();
    assert_eq!(err.code(), &CliErrorCode::ConnectionFailed);
}

#[test]
fn test_audit_log_receives_one_line_per_command() {
    let (dir, config) = initialized(false);
    let mut settings = ShellConfig::load(&config).unwrap();
    settings.audit_log = Some(PathBuf::from("audit.log"));
    settings.save(&config).unwrap();

    exec(&config, "create", &["t1", "cf"]).unwrap();
    exec(&config, "exists", &["t1"]).unwrap();

    let log = fs::read_to_string(dir.path().join("audit.log")).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 2);
    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["action"], "COMMAND_EXECUTED");
    assert_eq!(first["command"], "create");
}

// =============================================================================
// SCRIPT
// =============================================================================

#[test]
fn test_script_runs_every_line_and_reports_failures() {
    let (dir, config) = initialized(false);
    let script = dir.path().join("setup.txt");
    fs::write(
        &script,
        "# tables\ncreate 't1', 'cf'\ndrop 't1'\ncreate 't2', 'cf'\n",
    )
    .unwrap();

    let err = cli::script(&config, false, true, &script).unwrap_err();
    assert_eq!(err.code(), &CliErrorCode::CommandFailed);
    assert!(err.message().contains("1 of 3"));

    // the failing drop does not stop the script
    let tables = load_state(&dir).list_tables().unwrap();
    assert_eq!(tables, vec!["t1".to_string(), "t2".to_string()]);
}

#[test]
fn test_script_with_unterminated_quote_runs_nothing() {
    let (dir, config) = initialized(false);
    let script = dir.path().join("bad.txt");
    fs::write(&script, "create 't1', 'cf'\ncreate 't2\n").unwrap();

    let err = cli::script(&config, false, true, &script).unwrap_err();
    assert_eq!(err.code(), &CliErrorCode::ParseError);
    assert!(load_state(&dir).list_tables().unwrap().is_empty());
}

// =============================================================================
// LISTING
// =============================================================================

#[test]
fn test_unknown_group_and_command() {
    assert_eq!(
        cli::list_commands(Some("nope")).unwrap_err().code(),
        &CliErrorCode::UnknownGroup
    );
    assert_eq!(
        cli::help("nope").unwrap_err().code(),
        &CliErrorCode::UnknownCommand
    );
    cli::list_commands(Some("replication")).unwrap();
    cli::help("grant").unwrap();
}
