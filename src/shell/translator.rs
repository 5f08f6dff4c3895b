//! Classify raw cluster failures for the operator

use std::sync::Arc;

use super::errors::{EntityKind, ErrorClassification, ShellError};
use crate::cluster::{Admin, AdminError, FailureKind};

/// Turns failures into [`ErrorClassification`]s.
///
/// Raw failures are classified on the deepest cause of their chain. Already
/// classified failures pass through unchanged.
#[derive(Clone)]
pub struct ErrorTranslator {
    admin: Arc<dyn Admin>,
    debug: bool,
}

impl ErrorTranslator {
    pub fn new(admin: Arc<dyn Admin>, debug: bool) -> Self {
        Self { admin, debug }
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn translate(&self, err: ShellError) -> ErrorClassification {
        match err {
            ShellError::Classified(classification) => classification,
            ShellError::Admin(err) => self.classify(&err),
        }
    }

    pub fn classify(&self, err: &AdminError) -> ErrorClassification {
        let root = err.root_cause();
        match root.kind() {
            FailureKind::TableNotFound(table) => {
                ErrorClassification::not_found(EntityKind::Table, table.as_str())
            }
            FailureKind::NamespaceNotFound(namespace) => {
                ErrorClassification::not_found(EntityKind::Namespace, namespace.as_str())
            }
            FailureKind::NoSuchColumnFamily { table, family } => {
                // the failure may predate an alter, so ask the cluster again
                let valid_families = self
                    .admin
                    .describe_table(table)
                    .map(|descriptor| descriptor.family_names())
                    .unwrap_or_default();
                ErrorClassification::ColumnFamilyNotFound {
                    family: family.clone(),
                    valid_families,
                }
            }
            FailureKind::TableExists(table) => ErrorClassification::AlreadyExists(table.clone()),
            _ => ErrorClassification::Unclassified {
                message: root.message().to_string(),
                backtrace: self.debug.then(|| backtrace_of(err)),
            },
        }
    }
}

/// Remote trace frames of the root cause, or the cause chain when the
/// cluster sent none.
fn backtrace_of(err: &AdminError) -> Vec<String> {
    let root = err.root_cause();
    if !root.trace().is_empty() {
        return root.trace().to_vec();
    }
    err.chain()
        .map(|link| format!("{}: {}", link.kind(), link.message()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{FamilyDescriptor, LocalCluster, TableDescriptor};

    fn translator(debug: bool) -> ErrorTranslator {
        let cluster = LocalCluster::new();
        cluster
            .create_table(&TableDescriptor::new("t1").with_family(FamilyDescriptor::new("cf1")))
            .unwrap();
        ErrorTranslator::new(Arc::new(cluster), debug)
    }

    #[test]
    fn test_namespace_not_found() {
        let c = translator(false).classify(&AdminError::namespace_not_found("ns"));
        assert_eq!(c, ErrorClassification::not_found(EntityKind::Namespace, "ns"));
    }

    #[test]
    fn test_family_list_is_recomputed() {
        let c = translator(false).classify(&AdminError::no_such_family("t1", "zz"));
        assert_eq!(
            c,
            ErrorClassification::ColumnFamilyNotFound {
                family: "zz".into(),
                valid_families: vec!["cf1".into()],
            }
        );
    }

    #[test]
    fn test_family_list_empty_when_describe_fails() {
        let c = translator(false).classify(&AdminError::no_such_family("gone", "zz"));
        match c {
            ErrorClassification::ColumnFamilyNotFound { valid_families, .. } => {
                assert!(valid_families.is_empty())
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unclassified_uses_root_message() {
        let err = AdminError::other("disk full").wrapped_by(FailureKind::Rpc, "call failed");
        let c = translator(false).classify(&err);
        assert_eq!(
            c,
            ErrorClassification::Unclassified {
                message: "disk full".into(),
                backtrace: None,
            }
        );
    }

    #[test]
    fn test_debug_backtrace_falls_back_to_chain() {
        let err = AdminError::other("disk full").wrapped_by(FailureKind::Rpc, "call failed");
        let c = translator(true).classify(&err);
        assert_eq!(
            c.backtrace().unwrap(),
            &["RPC_FAILURE: call failed".to_string(), "REMOTE_FAILURE: disk full".to_string()]
        );
    }

    #[test]
    fn test_classified_passes_through() {
        let c = translator(true).translate(ShellError::validation("bad"));
        assert_eq!(c, ErrorClassification::Validation("bad".into()));
    }
}
