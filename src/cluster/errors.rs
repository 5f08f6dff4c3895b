//! Raw failures raised by the cluster collaborator layer
//!
//! An `AdminError` is what the administrative, table and access-control stubs
//! hand back when a call fails. Failures may wrap other failures; the wrapped
//! cause is always reachable through [`AdminError::cause`], so walking the
//! chain never depends on what kind of failure sits at each link.

use std::fmt;
use std::iter;

use thiserror::Error;

/// Failure category reported by the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The named table does not exist.
    TableNotFound(String),

    /// The named namespace does not exist.
    NamespaceNotFound(String),

    /// The column family is not part of the table's descriptor.
    NoSuchColumnFamily { table: String, family: String },

    /// A table with this name already exists.
    TableExists(String),

    /// A namespace with this name already exists.
    NamespaceExists(String),

    /// The namespace still holds tables.
    NamespaceNotEmpty(String),

    /// The operation requires an enabled table.
    TableNotEnabled(String),

    /// The operation requires a disabled table.
    TableNotDisabled(String),

    /// A replication peer with this id is already registered.
    PeerExists(String),

    /// No replication peer with this id is registered.
    PeerNotFound(String),

    /// The region is unknown to the cluster.
    RegionNotFound(String),

    /// The snapshot is unknown to the cluster.
    SnapshotNotFound(String),

    /// The caller is not allowed to perform the operation.
    AccessDenied,

    /// The table does not host the requested endpoint service.
    NoSuchService(String),

    /// Remote invocation failed; the interesting failure is usually the cause.
    Rpc,

    /// Connection or transport failure.
    Io,

    /// Any other server-side failure.
    Other,
}

impl FailureKind {
    /// Stable name of the category, as the server reports it.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::TableNotFound(_) => "TABLE_NOT_FOUND",
            FailureKind::NamespaceNotFound(_) => "NAMESPACE_NOT_FOUND",
            FailureKind::NoSuchColumnFamily { .. } => "NO_SUCH_COLUMN_FAMILY",
            FailureKind::TableExists(_) => "TABLE_EXISTS",
            FailureKind::NamespaceExists(_) => "NAMESPACE_EXISTS",
            FailureKind::NamespaceNotEmpty(_) => "NAMESPACE_NOT_EMPTY",
            FailureKind::TableNotEnabled(_) => "TABLE_NOT_ENABLED",
            FailureKind::TableNotDisabled(_) => "TABLE_NOT_DISABLED",
            FailureKind::PeerExists(_) => "PEER_EXISTS",
            FailureKind::PeerNotFound(_) => "PEER_NOT_FOUND",
            FailureKind::RegionNotFound(_) => "REGION_NOT_FOUND",
            FailureKind::SnapshotNotFound(_) => "SNAPSHOT_NOT_FOUND",
            FailureKind::AccessDenied => "ACCESS_DENIED",
            FailureKind::NoSuchService(_) => "NO_SUCH_SERVICE",
            FailureKind::Rpc => "RPC_FAILURE",
            FailureKind::Io => "IO_FAILURE",
            FailureKind::Other => "REMOTE_FAILURE",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A failure raised by the cluster, possibly wrapping a deeper cause.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AdminError {
    kind: FailureKind,
    message: String,
    trace: Vec<String>,
    #[source]
    cause: Option<Box<AdminError>>,
}

impl AdminError {
    /// Create a failure with no wrapped cause.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            trace: Vec::new(),
            cause: None,
        }
    }

    pub fn table_not_found(table: &str) -> Self {
        Self::new(
            FailureKind::TableNotFound(table.to_string()),
            format!("Table '{}' was not found", table),
        )
    }

    pub fn namespace_not_found(namespace: &str) -> Self {
        Self::new(
            FailureKind::NamespaceNotFound(namespace.to_string()),
            format!("Namespace '{}' was not found", namespace),
        )
    }

    pub fn no_such_family(table: &str, family: &str) -> Self {
        Self::new(
            FailureKind::NoSuchColumnFamily {
                table: table.to_string(),
                family: family.to_string(),
            },
            format!(
                "Column family '{}' does not exist in table '{}'",
                family, table
            ),
        )
    }

    pub fn table_exists(table: &str) -> Self {
        Self::new(
            FailureKind::TableExists(table.to_string()),
            format!("Table '{}' already exists", table),
        )
    }

    pub fn namespace_exists(namespace: &str) -> Self {
        Self::new(
            FailureKind::NamespaceExists(namespace.to_string()),
            format!("Namespace '{}' already exists", namespace),
        )
    }

    pub fn namespace_not_empty(namespace: &str) -> Self {
        Self::new(
            FailureKind::NamespaceNotEmpty(namespace.to_string()),
            format!("Namespace '{}' still contains tables", namespace),
        )
    }

    pub fn table_not_enabled(table: &str) -> Self {
        Self::new(
            FailureKind::TableNotEnabled(table.to_string()),
            format!("Table '{}' is not enabled", table),
        )
    }

    pub fn table_not_disabled(table: &str) -> Self {
        Self::new(
            FailureKind::TableNotDisabled(table.to_string()),
            format!("Table '{}' is not disabled", table),
        )
    }

    pub fn peer_exists(id: &str) -> Self {
        Self::new(
            FailureKind::PeerExists(id.to_string()),
            format!("Replication peer '{}' already exists", id),
        )
    }

    pub fn peer_not_found(id: &str) -> Self {
        Self::new(
            FailureKind::PeerNotFound(id.to_string()),
            format!("Replication peer '{}' does not exist", id),
        )
    }

    pub fn region_not_found(region: &str) -> Self {
        Self::new(
            FailureKind::RegionNotFound(region.to_string()),
            format!("Region '{}' is not online", region),
        )
    }

    pub fn snapshot_not_found(snapshot: &str) -> Self {
        Self::new(
            FailureKind::SnapshotNotFound(snapshot.to_string()),
            format!("Snapshot '{}' does not exist", snapshot),
        )
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::new(FailureKind::AccessDenied, message)
    }

    pub fn no_such_service(table: &str) -> Self {
        Self::new(
            FailureKind::NoSuchService(table.to_string()),
            format!("No registered endpoint service found on table '{}'", table),
        )
    }

    pub fn rpc(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Rpc, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Io, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Other, message)
    }

    /// Attach remote trace frames to this failure.
    pub fn with_trace<I, S>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trace = frames.into_iter().map(Into::into).collect();
        self
    }

    /// Wrap this failure as the cause of a new outer failure.
    pub fn wrapped_by(self, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            trace: Vec::new(),
            cause: Some(Box::new(self)),
        }
    }

    /// Failure category.
    pub fn kind(&self) -> &FailureKind {
        &self.kind
    }

    /// Human-readable message of this link only.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Remote trace frames, outermost frame first.
    pub fn trace(&self) -> &[String] {
        &self.trace
    }

    /// The failure this one wraps, if any.
    pub fn cause(&self) -> Option<&AdminError> {
        self.cause.as_deref()
    }

    /// Every link of the cause chain, outermost first.
    pub fn chain(&self) -> impl Iterator<Item = &AdminError> {
        iter::successors(Some(self), |e| e.cause())
    }

    /// The deepest failure of the chain.
    pub fn root_cause(&self) -> &AdminError {
        let mut current = self;
        while let Some(next) = current.cause() {
            current = next;
        }
        current
    }
}

/// Result type for collaborator calls.
pub type AdminResult<T> = Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_is_outermost_first() {
        let err = AdminError::table_not_found("t1")
            .wrapped_by(FailureKind::Rpc, "call failed")
            .wrapped_by(FailureKind::Io, "connection lost");

        let kinds: Vec<_> = err.chain().map(|e| e.kind().as_str()).collect();
        assert_eq!(kinds, vec!["IO_FAILURE", "RPC_FAILURE", "TABLE_NOT_FOUND"]);
    }

    #[test]
    fn test_root_cause_without_wrapping() {
        let err = AdminError::other("boom");
        assert_eq!(err.root_cause().message(), "boom");
        assert!(err.cause().is_none());
    }

    #[test]
    fn test_root_cause_is_deepest() {
        let err = AdminError::peer_exists("1").wrapped_by(FailureKind::Rpc, "remote");
        assert_eq!(err.root_cause().kind(), &FailureKind::PeerExists("1".into()));
    }

    #[test]
    fn test_std_error_source_follows_cause() {
        use std::error::Error;

        let err = AdminError::io("reset").wrapped_by(FailureKind::Rpc, "rpc");
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("reset"));
    }

    #[test]
    fn test_trace_frames_attached() {
        let err = AdminError::other("x").with_trace(["a.rs:1", "b.rs:2"]);
        assert_eq!(err.trace().len(), 2);
    }
}
