//! Command results

use std::time::Duration;

use super::errors::ErrorClassification;
use super::table::TableRef;
use crate::bulk::BulkOperationReport;

/// What a successful command produced.
#[derive(Debug, Clone)]
pub enum CommandOutput {
    Empty,
    Rows {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Value(String),
    Table(TableRef),
    Bulk(BulkOperationReport),
}

impl CommandOutput {
    pub fn rows<H: Into<String>>(header: impl IntoIterator<Item = H>, rows: Vec<Vec<String>>) -> Self {
        CommandOutput::Rows {
            header: header.into_iter().map(Into::into).collect(),
            rows,
        }
    }

    pub fn value(value: impl ToString) -> Self {
        CommandOutput::Value(value.to_string())
    }

    /// Rows reported in the footer.
    pub fn row_count(&self) -> usize {
        match self {
            CommandOutput::Empty | CommandOutput::Table(_) => 0,
            CommandOutput::Rows { rows, .. } => rows.len(),
            CommandOutput::Value(_) => 1,
            CommandOutput::Bulk(report) => report.matched.len(),
        }
    }
}

/// Outcome of one dispatched command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub command: String,
    pub outcome: Result<CommandOutput, ErrorClassification>,
    pub elapsed: Duration,
}

impl CommandResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn output(&self) -> Option<&CommandOutput> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&ErrorClassification> {
        self.outcome.as_ref().err()
    }
}
