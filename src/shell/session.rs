//! Per-invocation shell context

use std::sync::Arc;

use super::confirmation::{Confirmer, ConsoleConfirmer};
use super::format::Formatter;
use super::translator::ErrorTranslator;
use crate::bulk::BulkRegexCoordinator;
use crate::cluster::{Admin, Connection};
use crate::config::ShellConfig;
use crate::observability::{AuditLog, NullAuditLog};
use crate::replication::ReplicationPeerManager;
use crate::security::PermissionManager;

/// Everything a command needs: the cluster connection, settings, where
/// output goes, who confirms batch operations and where audit records go.
pub struct Session {
    connection: Arc<dyn Connection>,
    config: ShellConfig,
    formatter: Formatter,
    confirmer: Box<dyn Confirmer>,
    audit: Arc<dyn AuditLog>,
}

impl Session {
    /// Session with default settings, printing to stdout and confirming on
    /// stdin.
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self {
            connection,
            config: ShellConfig::default(),
            formatter: Formatter::stdout(),
            confirmer: Box::new(ConsoleConfirmer::stdio()),
            audit: Arc::new(NullAuditLog),
        }
    }

    pub fn with_config(mut self, config: ShellConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    pub fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_confirmer(mut self, confirmer: Box<dyn Confirmer>) -> Self {
        self.confirmer = confirmer;
        self
    }

    pub fn with_audit_log(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn debug(&self) -> bool {
        self.config.debug
    }

    pub fn user(&self) -> &str {
        &self.config.user
    }

    pub fn connection(&self) -> Arc<dyn Connection> {
        Arc::clone(&self.connection)
    }

    pub fn admin(&self) -> Arc<dyn Admin> {
        self.connection.admin()
    }

    pub fn translator(&self) -> ErrorTranslator {
        ErrorTranslator::new(self.admin(), self.debug())
    }

    pub fn permissions(&self) -> PermissionManager {
        PermissionManager::new(self.connection(), self.config.acl_table.as_str())
    }

    pub fn replication(&self) -> ReplicationPeerManager {
        ReplicationPeerManager::new(self.connection.replication())
    }

    pub fn bulk(&self) -> BulkRegexCoordinator {
        BulkRegexCoordinator::new(self.admin(), self.translator())
            .with_audit_log(Arc::clone(&self.audit), self.config.user.as_str())
    }

    pub fn formatter_mut(&mut self) -> &mut Formatter {
        &mut self.formatter
    }

    pub fn confirmer_mut(&mut self) -> &mut dyn Confirmer {
        self.confirmer.as_mut()
    }

    pub fn audit(&self) -> &dyn AuditLog {
        self.audit.as_ref()
    }
}
