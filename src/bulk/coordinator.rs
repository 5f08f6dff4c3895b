//! Confirm-then-apply over every matching table

use std::sync::Arc;

use super::pattern::TablePattern;
use super::report::{BulkFailure, BulkOperationReport};
use super::BulkOperation;
use crate::cluster::{Admin, AdminResult};
use crate::observability::{
    log_event_with_fields, AuditAction, AuditLog, AuditOutcome, AuditRecord, Event,
    NullAuditLog, ObservationScope,
};
use crate::shell::{Confirmer, ErrorTranslator, ShellResult};

pub struct BulkRegexCoordinator {
    admin: Arc<dyn Admin>,
    translator: ErrorTranslator,
    audit: Arc<dyn AuditLog>,
    operator: String,
}

impl BulkRegexCoordinator {
    pub fn new(admin: Arc<dyn Admin>, translator: ErrorTranslator) -> Self {
        Self {
            admin,
            translator,
            audit: Arc::new(NullAuditLog),
            operator: String::new(),
        }
    }

    /// Record confirmation requests and answers in `audit`.
    pub fn with_audit_log(mut self, audit: Arc<dyn AuditLog>, operator: impl Into<String>) -> Self {
        self.audit = audit;
        self.operator = operator.into();
        self
    }

    /// Apply `operation` to every table matching `pattern`.
    ///
    /// Nothing is asked or changed when no table matches or the operator
    /// declines. Per-table failures land in the report.
    pub fn apply(
        &self,
        operation: BulkOperation,
        pattern: &TablePattern,
        confirmer: &mut dyn Confirmer,
    ) -> ShellResult<BulkOperationReport> {
        let regex = pattern.regex()?;
        let matched: Vec<String> = self
            .admin
            .list_tables()?
            .into_iter()
            .filter(|name| regex.is_match(name))
            .collect();
        let mut report = BulkOperationReport::new(operation, pattern.as_str(), matched);
        if report.matched.is_empty() {
            return Ok(report);
        }

        let count = report.matched.len().to_string();
        log_event_with_fields(
            Event::BulkConfirmationRequested,
            &[("operation", operation.command_name()), ("tables", count.as_str())],
        );
        self.record(operation, pattern, AuditAction::ConfirmationRequested, AuditOutcome::Pending);

        let prompt = format!("{} the above {} tables (y/n)?", operation.imperative(), count);
        if !confirmer.confirm(&prompt, &report.matched) {
            log_event_with_fields(
                Event::BulkAborted,
                &[("operation", operation.command_name()), ("pattern", pattern.as_str())],
            );
            self.record(operation, pattern, AuditAction::ConfirmationRejected, AuditOutcome::Rejected);
            return Ok(report);
        }
        self.record(operation, pattern, AuditAction::ConfirmationProvided, AuditOutcome::Success);
        report.confirmed = true;

        let observation = ObservationScope::with_fields(
            "BULK",
            &[("operation", operation.command_name()), ("tables", count.as_str())],
        );
        for table in report.matched.clone() {
            match self.apply_one(operation, &table) {
                Ok(()) => report.succeeded.push(table),
                Err(err) => {
                    let cause = self.translator.classify(&err);
                    log_event_with_fields(
                        Event::BulkEntityFailed,
                        &[("table", table.as_str()), ("reason", cause.to_string().as_str())],
                    );
                    report.failed.push(BulkFailure { name: table, cause });
                }
            }
        }
        observation.complete_with_fields(&[
            ("succeeded", report.succeeded.len().to_string().as_str()),
            ("failed", report.failed.len().to_string().as_str()),
        ]);
        Ok(report)
    }

    fn apply_one(&self, operation: BulkOperation, table: &str) -> AdminResult<()> {
        match operation {
            BulkOperation::Enable => self.admin.enable_table(table),
            BulkOperation::Disable => self.admin.disable_table(table),
            BulkOperation::Drop => self.admin.drop_table(table),
        }
    }

    fn record(
        &self,
        operation: BulkOperation,
        pattern: &TablePattern,
        action: AuditAction,
        outcome: AuditOutcome,
    ) {
        let mut record = AuditRecord::new(action, outcome)
            .with_command(operation.command_name())
            .with_target(pattern.as_str());
        if !self.operator.is_empty() {
            record = record.with_operator(self.operator.as_str());
        }
        if let Err(e) = self.audit.append(&record) {
            log_event_with_fields(
                Event::AuditAppendFailed,
                &[
                    ("command", operation.command_name()),
                    ("error", e.to_string().as_str()),
                ],
            );
        }
    }
}
