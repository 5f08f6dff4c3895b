//! Pattern-driven batch table operations
//!
//! `enable_all`, `disable_all` and `drop_all` list the cluster's tables,
//! keep those matching a pattern, ask the operator to confirm, then apply
//! the single-table operation to each match in listing order. A failure on
//! one table is recorded in the report and does not stop the batch.

mod coordinator;
mod pattern;
mod report;

use std::fmt;

pub use coordinator::BulkRegexCoordinator;
pub use pattern::TablePattern;
pub use report::{BulkFailure, BulkOperationReport};

/// Single-table operation applied by a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOperation {
    Enable,
    Disable,
    Drop,
}

impl BulkOperation {
    /// Command name of the batch form.
    pub fn command_name(&self) -> &'static str {
        match self {
            BulkOperation::Enable => "enable_all",
            BulkOperation::Disable => "disable_all",
            BulkOperation::Drop => "drop_all",
        }
    }

    /// Past participle used in summaries.
    pub fn verb(&self) -> &'static str {
        match self {
            BulkOperation::Enable => "enabled",
            BulkOperation::Disable => "disabled",
            BulkOperation::Drop => "dropped",
        }
    }

    /// Imperative used in the confirmation prompt.
    pub fn imperative(&self) -> &'static str {
        match self {
            BulkOperation::Enable => "Enable",
            BulkOperation::Disable => "Disable",
            BulkOperation::Drop => "Drop",
        }
    }
}

impl fmt::Display for BulkOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command_name())
    }
}
