//! Shell configuration file
//!
//! ```json
//! {
//!   "cluster_state": "./colshell-state.json",
//!   "debug": false,
//!   "connection_attempts": 1,
//!   "acl_table": "system:acl",
//!   "user": "admin",
//!   "audit_log": "./colshell-audit.log"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cli::{CliError, CliResult};
use crate::security::DEFAULT_ACL_TABLE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Cluster state file (required)
    pub cluster_state: PathBuf,

    /// Include remote backtraces in unclassified errors
    #[serde(default)]
    pub debug: bool,

    /// Connection attempts before giving up; 1 means no retry
    #[serde(default = "default_connection_attempts")]
    pub connection_attempts: u32,

    /// Table hosting the access-control endpoint
    #[serde(default = "default_acl_table")]
    pub acl_table: String,

    /// Operator name recorded in audit records
    #[serde(default = "default_user")]
    pub user: String,

    /// Append audit records here when set
    #[serde(default)]
    pub audit_log: Option<PathBuf>,
}

fn default_connection_attempts() -> u32 {
    1
}

fn default_acl_table() -> String {
    DEFAULT_ACL_TABLE.to_string()
}

fn default_user() -> String {
    "admin".to_string()
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            cluster_state: PathBuf::from("./colshell-state.json"),
            debug: false,
            connection_attempts: default_connection_attempts(),
            acl_table: default_acl_table(),
            user: default_user(),
            audit_log: None,
        }
    }
}

impl ShellConfig {
    /// Configuration for a given state file, every other field defaulted.
    pub fn for_state(cluster_state: impl Into<PathBuf>) -> Self {
        Self {
            cluster_state: cluster_state.into(),
            ..Self::default()
        }
    }

    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: ShellConfig = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON.
    pub fn save(&self, path: &Path) -> CliResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> CliResult<()> {
        if self.cluster_state.as_os_str().is_empty() {
            return Err(CliError::config_error("cluster_state must not be empty"));
        }
        if self.connection_attempts == 0 {
            return Err(CliError::config_error("connection_attempts must be >= 1"));
        }
        match self.acl_table.split_once(':') {
            Some((ns, table)) if !ns.is_empty() && !table.is_empty() => {}
            _ => {
                return Err(CliError::config_error(format!(
                    "Invalid acl_table: '{}'. Expected 'namespace:table'.",
                    self.acl_table
                )))
            }
        }
        if self.user.trim().is_empty() {
            return Err(CliError::config_error("user must not be empty"));
        }
        Ok(())
    }

    /// Resolve relative paths against the directory holding the config file.
    pub fn resolve_paths(mut self, config_path: &Path) -> Self {
        let base = config_path.parent().unwrap_or_else(|| Path::new("."));
        if self.cluster_state.is_relative() {
            self.cluster_state = base.join(&self.cluster_state);
        }
        if let Some(audit) = self.audit_log.take() {
            self.audit_log = Some(if audit.is_relative() {
                base.join(audit)
            } else {
                audit
            });
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_from_minimal_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("colshell.json");
        fs::write(&path, r#"{"cluster_state": "state.json"}"#).unwrap();

        let config = ShellConfig::load(&path).unwrap();
        assert!(!config.debug);
        assert_eq!(config.connection_attempts, 1);
        assert_eq!(config.acl_table, "system:acl");
        assert_eq!(config.user, "admin");
        assert!(config.audit_log.is_none());
    }

    #[test]
    fn test_missing_state_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("colshell.json");
        fs::write(&path, r#"{"debug": true}"#).unwrap();
        let err = ShellConfig::load(&path).unwrap_err();
        assert_eq!(err.code_str(), "COLSHELL_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = ShellConfig::default();
        config.connection_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_acl_table_must_be_qualified() {
        let mut config = ShellConfig::default();
        config.acl_table = "acl".into();
        assert!(config.validate().is_err());
        config.acl_table = "hbase:acl".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_relative_paths_resolved() {
        let config = ShellConfig {
            audit_log: Some(PathBuf::from("audit.log")),
            ..ShellConfig::for_state("state.json")
        }
        .resolve_paths(Path::new("/etc/colshell/colshell.json"));
        assert_eq!(config.cluster_state, PathBuf::from("/etc/colshell/state.json"));
        assert_eq!(config.audit_log, Some(PathBuf::from("/etc/colshell/audit.log")));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("colshell.json");
        let config = ShellConfig::for_state("state.json");
        config.save(&path).unwrap();
        assert_eq!(ShellConfig::load(&path).unwrap(), config);
    }
}
