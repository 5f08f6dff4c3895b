//! Cluster collaborator interfaces
//!
//! The shell never talks to the wire itself. Everything it needs from the
//! cluster is expressed here as blocking traits:
//! - `Admin` for table, namespace, region, snapshot and status operations
//! - `TableHandle` for data access on one table and for reaching the
//!   endpoint service hosted on it
//! - `AccessControlService` for the access-control endpoint
//! - `ReplicationAdmin` for replication peer control
//!
//! Each method corresponds to exactly one remote operation and either
//! succeeds or returns an [`AdminError`].
//!
//! [`LocalCluster`] is the in-process implementation used by the binary and
//! by the tests.

mod errors;
mod memory;
mod types;

use std::sync::Arc;

pub use errors::{AdminError, AdminResult, FailureKind};
pub use memory::{ClusterState, LocalCluster};
pub use types::{
    namespace_of, Cell, ClusterStatus, Column, FamilyDescriptor, RegionInfo, ReplicatedFamily,
    ReplicationPeer, ScanSpec, SnapshotInfo, TableCfs, TableDescriptor, DEFAULT_MAX_VERSIONS,
    REPLICATION_SCOPE_GLOBAL,
};

use crate::security::{PermissionRow, PermissionScope};

/// An open connection to a cluster.
pub trait Connection: Send + Sync {
    /// Long-lived administrative stub.
    fn admin(&self) -> Arc<dyn Admin>;

    /// Long-lived replication control stub.
    fn replication(&self) -> Arc<dyn ReplicationAdmin>;

    /// Open a handle on one table. The caller must `close` it.
    fn open_table(&self, name: &str) -> AdminResult<Box<dyn TableHandle>>;
}

/// Administrative operations.
pub trait Admin: Send + Sync {
    /// All table names, in cluster listing order.
    fn list_tables(&self) -> AdminResult<Vec<String>>;

    fn table_exists(&self, table: &str) -> AdminResult<bool>;

    fn describe_table(&self, table: &str) -> AdminResult<TableDescriptor>;

    fn create_table(&self, descriptor: &TableDescriptor) -> AdminResult<()>;

    fn add_family(&self, table: &str, family: &FamilyDescriptor) -> AdminResult<()>;

    fn delete_family(&self, table: &str, family: &str) -> AdminResult<()>;

    fn enable_table(&self, table: &str) -> AdminResult<()>;

    fn disable_table(&self, table: &str) -> AdminResult<()>;

    fn is_table_enabled(&self, table: &str) -> AdminResult<bool>;

    /// Drop a disabled table.
    fn drop_table(&self, table: &str) -> AdminResult<()>;

    fn list_namespaces(&self) -> AdminResult<Vec<String>>;

    fn namespace_exists(&self, namespace: &str) -> AdminResult<bool>;

    fn create_namespace(&self, namespace: &str) -> AdminResult<()>;

    /// Drop an empty namespace.
    fn drop_namespace(&self, namespace: &str) -> AdminResult<()>;

    fn list_regions(&self, table: &str) -> AdminResult<Vec<RegionInfo>>;

    /// Move a region to `server`, or to a server of the cluster's choosing.
    fn move_region(&self, encoded_name: &str, server: Option<&str>) -> AdminResult<()>;

    fn assign_region(&self, encoded_name: &str) -> AdminResult<()>;

    fn unassign_region(&self, encoded_name: &str, force: bool) -> AdminResult<()>;

    /// Turn the balancer on or off; returns the previous setting.
    fn set_balancer(&self, enabled: bool) -> AdminResult<bool>;

    fn snapshot(&self, snapshot: &str, table: &str) -> AdminResult<()>;

    fn list_snapshots(&self) -> AdminResult<Vec<SnapshotInfo>>;

    fn delete_snapshot(&self, snapshot: &str) -> AdminResult<()>;

    fn cluster_status(&self) -> AdminResult<ClusterStatus>;
}

/// An open handle on a single table.
pub trait TableHandle: Send {
    fn name(&self) -> &str;

    /// Cells of one row, optionally restricted to some columns.
    fn get(&self, row: &str, columns: &[Column]) -> AdminResult<Vec<Cell>>;

    fn put(
        &self,
        row: &str,
        family: &str,
        qualifier: &str,
        value: &[u8],
        timestamp: Option<i64>,
    ) -> AdminResult<()>;

    /// Delete one column of a row, or the whole row when `column` is `None`.
    fn delete(&self, row: &str, column: Option<&Column>) -> AdminResult<()>;

    fn scan(&self, spec: &ScanSpec) -> AdminResult<Vec<Cell>>;

    /// Atomically add `amount` to an 8-byte counter cell; returns the new value.
    fn increment(&self, row: &str, family: &str, qualifier: &str, amount: i64)
        -> AdminResult<i64>;

    /// Blocking stub for the access-control endpoint hosted on this table.
    fn access_control_service(&self) -> AdminResult<Arc<dyn AccessControlService>>;

    /// Release the handle and its cluster-side resources.
    fn close(&mut self) -> AdminResult<()>;
}

/// Remote access-control endpoint.
///
/// Action sets travel as their encoded byte codes. An empty action set in
/// `revoke` means every action.
pub trait AccessControlService: Send + Sync {
    fn grant(&self, principal: &str, scope: &PermissionScope, actions: &[u8]) -> AdminResult<()>;

    fn revoke(&self, principal: &str, scope: &PermissionScope, actions: &[u8])
        -> AdminResult<()>;

    /// Permission rows recorded at exactly `scope` (and, for a table, its
    /// family and qualifier scopes).
    fn get_user_permissions(&self, scope: &PermissionScope) -> AdminResult<Vec<PermissionRow>>;
}

/// Replication peer control.
pub trait ReplicationAdmin: Send + Sync {
    fn add_peer(&self, peer: &ReplicationPeer) -> AdminResult<()>;

    fn remove_peer(&self, id: &str) -> AdminResult<()>;

    fn list_peers(&self) -> AdminResult<Vec<ReplicationPeer>>;

    /// `true` when the peer is enabled.
    fn get_peer_state(&self, id: &str) -> AdminResult<bool>;

    fn enable_peer(&self, id: &str) -> AdminResult<()>;

    fn disable_peer(&self, id: &str) -> AdminResult<()>;

    fn set_peer_table_cfs(&self, id: &str, table_cfs: Option<&TableCfs>) -> AdminResult<()>;

    fn list_replicated(&self) -> AdminResult<Vec<ReplicatedFamily>>;
}
