//! Shell error model
//!
//! Two layers:
//! - `ShellError` is what a command handler returns: either a failure the
//!   shell already classified locally (validation, existence, security), or a
//!   raw [`AdminError`] from the cluster that still needs translating.
//! - `ErrorClassification` is the operator-facing diagnosis produced at the
//!   command boundary.

use std::fmt;

use thiserror::Error;

use crate::cluster::AdminError;

/// Kind of entity a `NotFound` classification refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Table,
    Namespace,
    Command,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Table => "table",
            EntityKind::Namespace => "namespace",
            EntityKind::Command => "command",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operator-facing diagnosis of a failed command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorClassification {
    #[error("Unknown {kind} {name}!")]
    NotFound { kind: EntityKind, name: String },

    #[error("Table already exists: {0}!")]
    AlreadyExists(String),

    #[error(
        "Unknown column family {family}! Valid column names: {}",
        column_globs(.valid_families)
    )]
    ColumnFamilyNotFound {
        family: String,
        valid_families: Vec<String>,
    },

    #[error("DISABLED: Security features are not available")]
    SecurityUnavailable,

    #[error("{0}")]
    Validation(String),

    #[error("{message}")]
    Unclassified {
        message: String,
        /// Present only when the session runs in debug mode.
        backtrace: Option<Vec<String>>,
    },
}

impl ErrorClassification {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorClassification::NotFound { .. } => "COLSHELL_NOT_FOUND",
            ErrorClassification::AlreadyExists(_) => "COLSHELL_ALREADY_EXISTS",
            ErrorClassification::ColumnFamilyNotFound { .. } => "COLSHELL_NO_SUCH_COLUMN_FAMILY",
            ErrorClassification::SecurityUnavailable => "COLSHELL_SECURITY_UNAVAILABLE",
            ErrorClassification::Validation(_) => "COLSHELL_VALIDATION_ERROR",
            ErrorClassification::Unclassified { .. } => "COLSHELL_UNCLASSIFIED",
        }
    }

    pub fn not_found(kind: EntityKind, name: impl Into<String>) -> Self {
        ErrorClassification::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn backtrace(&self) -> Option<&[String]> {
        match self {
            ErrorClassification::Unclassified {
                backtrace: Some(frames),
                ..
            } => Some(frames),
            _ => None,
        }
    }
}

fn column_globs(families: &[String]) -> String {
    families
        .iter()
        .map(|f| format!("{}:*", f))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failure returned by command handlers.
#[derive(Debug, Clone, Error)]
pub enum ShellError {
    /// Already diagnosed by the shell.
    #[error(transparent)]
    Classified(#[from] ErrorClassification),

    /// Raised by the cluster; needs translating.
    #[error(transparent)]
    Admin(#[from] AdminError),
}

impl ShellError {
    pub fn validation(message: impl Into<String>) -> Self {
        ShellError::Classified(ErrorClassification::Validation(message.into()))
    }

    pub fn not_found(kind: EntityKind, name: impl Into<String>) -> Self {
        ShellError::Classified(ErrorClassification::not_found(kind, name))
    }

    pub fn classification(&self) -> Option<&ErrorClassification> {
        match self {
            ShellError::Classified(c) => Some(c),
            ShellError::Admin(_) => None,
        }
    }
}

/// Result type for shell operations.
pub type ShellResult<T> = Result<T, ShellError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let c = ErrorClassification::not_found(EntityKind::Table, "t1");
        assert_eq!(c.to_string(), "Unknown table t1!");
        assert_eq!(c.code(), "COLSHELL_NOT_FOUND");
    }

    #[test]
    fn test_family_display_lists_valid_names() {
        let c = ErrorClassification::ColumnFamilyNotFound {
            family: "x".into(),
            valid_families: vec!["cf1".into(), "cf2".into()],
        };
        let msg = c.to_string();
        assert!(msg.contains("cf1:*, cf2:*"));
        assert!(msg.contains("x"));
    }

    #[test]
    fn test_backtrace_only_on_unclassified() {
        let c = ErrorClassification::Unclassified {
            message: "m".into(),
            backtrace: Some(vec!["f1".into()]),
        };
        assert_eq!(c.backtrace().map(|b| b.len()), Some(1));
        assert!(ErrorClassification::SecurityUnavailable.backtrace().is_none());
    }

    #[test]
    fn test_validation_helper() {
        let err = ShellError::validation("bad");
        assert_eq!(
            err.classification(),
            Some(&ErrorClassification::Validation("bad".into()))
        );
    }
}
