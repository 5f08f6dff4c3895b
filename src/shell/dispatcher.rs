//! Command dispatcher
//!
//! Resolves a command name, runs its handler against the session, and turns
//! any failure into an [`ErrorClassification`] at this single boundary.
//! Every execution is timed, logged and audited.

use std::io;
use std::time::Instant;

use super::commands::CommandRegistry;
use super::errors::{EntityKind, ErrorClassification, ShellError};
use super::handlers;
use super::session::Session;
use super::types::CommandResult;
use crate::observability::{
    log_event_with_fields, AuditAction, AuditOutcome, AuditRecord, Event,
    ObservationScope,
};

#[derive(Debug, Clone, Default)]
pub struct CommandDispatcher {
    registry: CommandRegistry,
}

impl CommandDispatcher {
    pub fn new(registry: CommandRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Execute `name` with `args`.
    ///
    /// Never fails: the outcome, successful or classified, is carried in the
    /// returned [`CommandResult`].
    pub fn execute(&self, session: &mut Session, name: &str, args: &[String]) -> CommandResult {
        let start = Instant::now();
        let scope = ObservationScope::with_fields("COMMAND", &[("command", name)]);

        let outcome = match self.registry.lookup(name) {
            Some(command) => {
                log_event_with_fields(Event::CommandDispatched, &[("command", command.name)]);
                handlers::execute(command, session, args)
            }
            None => Err(ShellError::not_found(EntityKind::Command, name)),
        };
        let outcome = outcome.map_err(|err| session.translator().translate(err));
        let elapsed = start.elapsed();

        let mut record = match &outcome {
            Ok(output) => {
                scope.complete_with_fields(&[("rows", output.row_count().to_string().as_str())]);
                AuditRecord::new(AuditAction::CommandExecuted, AuditOutcome::Success)
            }
            Err(classification @ ErrorClassification::Unclassified { .. }) => {
                scope.fail(&classification.to_string());
                AuditRecord::new(AuditAction::CommandFailed, AuditOutcome::Failed)
                    .with_error(classification.code(), classification.to_string())
            }
            Err(classification) => {
                scope.reject(&classification.to_string());
                AuditRecord::new(AuditAction::CommandRejected, AuditOutcome::Rejected)
                    .with_error(classification.code(), classification.to_string())
            }
        };
        record = record
            .with_command(name)
            .with_operator(session.user())
            .with_elapsed_ms(elapsed.as_millis() as u64);
        if let Some(target) = args.first() {
            record = record.with_target(target.as_str());
        }
        if let Err(e) = session.audit().append(&record) {
            log_event_with_fields(
                Event::AuditAppendFailed,
                &[("command", name), ("error", e.to_string().as_str())],
            );
        }

        CommandResult {
            command: name.to_string(),
            outcome,
            elapsed,
        }
    }

    /// Execute and render through the session formatter. Failures are
    /// followed by the command's help when the command exists.
    pub fn run(&self, session: &mut Session, name: &str, args: &[String]) -> io::Result<CommandResult> {
        let result = self.execute(session, name, args);
        let help = match (&result.outcome, self.registry.lookup(name)) {
            (Err(_), Some(command)) => Some(command.help_text()),
            _ => None,
        };
        session.formatter_mut().render(&result, help.as_deref())?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::cluster::LocalCluster;
    use crate::observability::MemoryAuditLog;
    use crate::shell::{Formatter, RecordingConfirmer};

    fn session(cluster: &LocalCluster) -> (Session, MemoryAuditLog) {
        let audit = MemoryAuditLog::new();
        let (formatter, _buffer) = Formatter::buffered();
        let session = Session::new(Arc::new(cluster.clone()))
            .with_formatter(formatter)
            .with_confirmer(Box::new(RecordingConfirmer::answering(true)))
            .with_audit_log(Arc::new(audit.clone()));
        (session, audit)
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_unknown_command() {
        let cluster = LocalCluster::new();
        let (mut session, audit) = session(&cluster);
        let result = CommandDispatcher::default().execute(&mut session, "frobnicate", &[]);
        assert_eq!(
            result.error(),
            Some(&ErrorClassification::not_found(EntityKind::Command, "frobnicate"))
        );
        assert!(cluster.calls().is_empty());
        assert_eq!(audit.records()[0].action, AuditAction::CommandRejected);
    }

    #[test]
    fn test_success_is_audited() {
        let cluster = LocalCluster::new();
        let (mut session, audit) = session(&cluster);
        let dispatcher = CommandDispatcher::default();
        let result = dispatcher.execute(&mut session, "create", &args(&["t1", "cf"]));
        assert!(result.is_success());

        let records = audit.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, AuditAction::CommandExecuted);
        assert_eq!(records[0].command.as_deref(), Some("create"));
        assert_eq!(records[0].target.as_deref(), Some("t1"));
        assert_eq!(records[0].operator.as_deref(), Some("admin"));
    }

    #[test]
    fn test_cluster_failure_is_translated() {
        let cluster = LocalCluster::new();
        let (mut session, audit) = session(&cluster);
        let result = CommandDispatcher::default().execute(&mut session, "describe", &args(&["nope"]));
        assert_eq!(
            result.error(),
            Some(&ErrorClassification::not_found(EntityKind::Table, "nope"))
        );
        assert_eq!(audit.records()[0].outcome, AuditOutcome::Rejected);
    }

    #[test]
    fn test_run_renders_help_after_error() {
        let cluster = LocalCluster::new();
        let audit = MemoryAuditLog::new();
        let (formatter, buffer) = Formatter::buffered();
        let mut session = Session::new(Arc::new(cluster))
            .with_formatter(formatter)
            .with_audit_log(Arc::new(audit));

        let result = CommandDispatcher::default()
            .run(&mut session, "drop", &[])
            .unwrap();
        assert!(!result.is_success());
        let out = buffer.contents();
        assert!(out.contains("ERROR: wrong number of arguments for 'drop'"));
        assert!(out.contains("Here is some help for this command:"));
        assert!(out.contains("Usage: drop <table>"));
    }
}
