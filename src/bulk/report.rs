//! Outcome of a batch table operation

use super::BulkOperation;
use crate::shell::ErrorClassification;

/// A table the batch could not process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkFailure {
    pub name: String,
    pub cause: ErrorClassification,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOperationReport {
    pub operation: BulkOperation,
    pub pattern: String,
    /// Matching tables in listing order.
    pub matched: Vec<String>,
    /// Whether the operator approved the batch.
    pub confirmed: bool,
    pub succeeded: Vec<String>,
    pub failed: Vec<BulkFailure>,
}

impl BulkOperationReport {
    pub fn new(operation: BulkOperation, pattern: impl Into<String>, matched: Vec<String>) -> Self {
        Self {
            operation,
            pattern: pattern.into(),
            matched,
            confirmed: false,
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn failed_names(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.name.as_str()).collect()
    }

    /// Tables the batch attempted, in order.
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Operator-facing summary. Nothing is reported for a batch that did not
    /// run; the failure line appears only when a table failed.
    pub fn summary_lines(&self) -> Vec<String> {
        if self.matched.is_empty() {
            return vec![format!("No tables matched '{}'", self.pattern)];
        }
        if !self.confirmed {
            return vec![format!(
                "{} not confirmed; no tables {}",
                self.operation,
                self.operation.verb()
            )];
        }
        let verb = self.operation.verb();
        let mut lines = vec![format!("{} tables successfully {}", self.succeeded.len(), verb)];
        if !self.failed.is_empty() {
            lines.push(format!(
                "{} tables not {} due to an exception: {}",
                self.failed.len(),
                verb,
                self.failed_names().join(",")
            ));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> BulkOperationReport {
        let mut report = BulkOperationReport::new(
            BulkOperation::Drop,
            "t.*",
            vec!["ta".into(), "tb".into(), "tc".into()],
        );
        report.confirmed = true;
        report
    }

    #[test]
    fn test_summary_with_failures() {
        let mut report = report();
        report.succeeded = vec!["ta".into(), "tc".into()];
        report.failed.push(BulkFailure {
            name: "tb".into(),
            cause: ErrorClassification::Validation("x".into()),
        });
        assert_eq!(
            report.summary_lines(),
            vec![
                "2 tables successfully dropped".to_string(),
                "1 tables not dropped due to an exception: tb".to_string(),
            ]
        );
        assert_eq!(report.attempted(), 3);
    }

    #[test]
    fn test_summary_without_failures() {
        let mut report = report();
        report.succeeded = report.matched.clone();
        assert_eq!(report.summary_lines(), vec!["3 tables successfully dropped".to_string()]);
    }

    #[test]
    fn test_summary_when_declined() {
        let report = BulkOperationReport::new(BulkOperation::Disable, "t.*", vec!["ta".into()]);
        assert_eq!(
            report.summary_lines(),
            vec!["disable_all not confirmed; no tables disabled".to_string()]
        );
    }
}
