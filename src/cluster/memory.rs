//! In-process cluster
//!
//! `LocalCluster` implements every collaborator trait against an in-memory
//! `ClusterState` that can be loaded from and saved to a JSON file. The
//! command-line binary runs against it, and tests use it as a recording fake:
//! - every remote operation is appended to a call log (`calls`)
//! - a failure can be injected for the next call of an operation
//!   (`inject_failure`), optionally keyed on its argument (`op:arg`)
//! - open table handles are counted (`open_handles`)
//!
//! Only the newest version of each cell is kept.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{AdminError, AdminResult};
use super::types::{
    namespace_of, Cell, ClusterStatus, Column, FamilyDescriptor, RegionInfo, ReplicatedFamily,
    ReplicationPeer, ScanSpec, SnapshotInfo, TableCfs, TableDescriptor,
};
use super::{AccessControlService, Admin, Connection, ReplicationAdmin, TableHandle};
use crate::security::{ActionSet, PermissionGrant, PermissionRow, PermissionScope, DEFAULT_ACL_TABLE};

const DEFAULT_NAMESPACE: &str = "default";
const SYSTEM_NAMESPACE: &str = "system";
const ACL_FAMILY: &str = "l";

/// Persistable cluster state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterState {
    #[serde(default = "default_namespaces")]
    pub namespaces: BTreeSet<String>,

    #[serde(default)]
    pub tables: BTreeMap<String, TableState>,

    #[serde(default)]
    pub peers: BTreeMap<String, ReplicationPeer>,

    #[serde(default)]
    pub acl: Vec<PermissionGrant>,

    #[serde(default)]
    pub snapshots: Vec<SnapshotInfo>,

    #[serde(default = "default_servers")]
    pub live_servers: Vec<String>,

    #[serde(default)]
    pub dead_servers: Vec<String>,

    #[serde(default = "default_true")]
    pub balancer_enabled: bool,
}

fn default_namespaces() -> BTreeSet<String> {
    [DEFAULT_NAMESPACE, SYSTEM_NAMESPACE]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_servers() -> Vec<String> {
    vec!["localhost,16020,1".to_string()]
}

fn default_true() -> bool {
    true
}

impl Default for ClusterState {
    fn default() -> Self {
        Self {
            namespaces: default_namespaces(),
            tables: BTreeMap::new(),
            peers: BTreeMap::new(),
            acl: Vec::new(),
            snapshots: Vec::new(),
            live_servers: default_servers(),
            dead_servers: Vec::new(),
            balancer_enabled: true,
        }
    }
}

/// One table: descriptor, state, regions and cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableState {
    pub descriptor: TableDescriptor,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub regions: Vec<RegionInfo>,

    /// row → `family:qualifier` → newest value
    #[serde(default)]
    pub rows: BTreeMap<String, BTreeMap<String, StoredValue>>,
}

/// Newest version of a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredValue {
    pub timestamp: i64,
    #[serde(with = "value_encoding")]
    pub value: Vec<u8>,
}

mod value_encoding {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

struct Inner {
    state: RwLock<ClusterState>,
    acl_table: String,
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<String, AdminError>>,
    open_handles: AtomicUsize,
}

/// In-process cluster. Clones share state.
#[derive(Clone)]
pub struct LocalCluster {
    inner: Arc<Inner>,
}

impl Default for LocalCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LocalCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCluster")
            .field("acl_table", &self.inner.acl_table)
            .field("open_handles", &self.open_handles())
            .finish()
    }
}

impl LocalCluster {
    /// Empty cluster without security.
    pub fn new() -> Self {
        Self::from_state(ClusterState::default())
    }

    pub fn from_state(state: ClusterState) -> Self {
        Self::build(state, DEFAULT_ACL_TABLE.to_string())
    }

    /// Host the access-control endpoint on `acl_table` instead of the default.
    pub fn with_acl_table(self, acl_table: impl Into<String>) -> Self {
        Self::build(self.state(), acl_table.into())
    }

    fn build(state: ClusterState, acl_table: String) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(state),
                acl_table,
                calls: Mutex::new(Vec::new()),
                failures: Mutex::new(HashMap::new()),
                open_handles: AtomicUsize::new(0),
            }),
        }
    }

    /// Create the ACL system table, enabling the access-control endpoint.
    pub fn secured(self) -> Self {
        if let Ok(mut state) = self.inner.state.write() {
            let acl_table = self.inner.acl_table.clone();
            state
                .namespaces
                .insert(namespace_of(&acl_table).to_string());
            if !state.tables.contains_key(&acl_table) {
                let descriptor =
                    TableDescriptor::new(acl_table.clone()).with_family(FamilyDescriptor::new(ACL_FAMILY));
                let regions = vec![new_region(&acl_table, state.live_servers.first())];
                state.tables.insert(
                    acl_table,
                    TableState {
                        descriptor,
                        enabled: true,
                        regions,
                        rows: BTreeMap::new(),
                    },
                );
            }
        }
        self
    }

    /// Load state from a JSON file.
    pub fn load(path: &Path) -> AdminResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AdminError::io(format!("Failed to read cluster state {}: {}", path.display(), e))
        })?;
        let state: ClusterState = serde_json::from_str(&content).map_err(|e| {
            AdminError::io(format!("Invalid cluster state {}: {}", path.display(), e))
        })?;
        Ok(Self::from_state(state))
    }

    /// Write state to a JSON file, replacing it atomically.
    pub fn save(&self, path: &Path) -> AdminResult<()> {
        let state = self.read()?;
        let json = serde_json::to_string_pretty(&*state)
            .map_err(|e| AdminError::io(format!("Failed to encode cluster state: {}", e)))?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json)
            .and_then(|_| fs::rename(&tmp, path))
            .map_err(|e| {
                AdminError::io(format!("Failed to write cluster state {}: {}", path.display(), e))
            })
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ClusterState {
        match self.inner.state.read() {
            Ok(state) => state.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn acl_table(&self) -> &str {
        &self.inner.acl_table
    }

    /// Recorded remote operations, `op` or `op:arg`.
    pub fn calls(&self) -> Vec<String> {
        match self.inner.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of recorded calls of `op`, whatever the argument.
    pub fn call_count(&self, op: &str) -> usize {
        let prefix = format!("{}:", op);
        self.calls()
            .iter()
            .filter(|c| c.as_str() == op || c.starts_with(&prefix))
            .count()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.inner.calls.lock() {
            calls.clear();
        }
    }

    /// Fail the next call matching `key` (`op` or `op:arg`) with `error`.
    pub fn inject_failure(&self, key: impl Into<String>, error: AdminError) {
        if let Ok(mut failures) = self.inner.failures.lock() {
            failures.insert(key.into(), error);
        }
    }

    /// Table handles opened and not yet closed.
    pub fn open_handles(&self) -> usize {
        self.inner.open_handles.load(Ordering::SeqCst)
    }

    fn record(&self, op: &str, arg: &str) -> AdminResult<()> {
        let keyed = if arg.is_empty() {
            op.to_string()
        } else {
            format!("{}:{}", op, arg)
        };
        if let Ok(mut calls) = self.inner.calls.lock() {
            calls.push(keyed.clone());
        }
        if let Ok(mut failures) = self.inner.failures.lock() {
            if let Some(err) = failures.remove(&keyed).or_else(|| failures.remove(op)) {
                return Err(err);
            }
        }
        Ok(())
    }

    fn read(&self) -> AdminResult<RwLockReadGuard<'_, ClusterState>> {
        self.inner
            .state
            .read()
            .map_err(|_| AdminError::other("Cluster state lock poisoned"))
    }

    fn write(&self) -> AdminResult<RwLockWriteGuard<'_, ClusterState>> {
        self.inner
            .state
            .write()
            .map_err(|_| AdminError::other("Cluster state lock poisoned"))
    }
}

fn new_region(table: &str, server: Option<&String>) -> RegionInfo {
    RegionInfo {
        encoded_name: Uuid::new_v4().simple().to_string(),
        table: table.to_string(),
        start_key: String::new(),
        end_key: String::new(),
        server: server.cloned(),
    }
}

fn table_mut<'a>(state: &'a mut ClusterState, table: &str) -> AdminResult<&'a mut TableState> {
    state
        .tables
        .get_mut(table)
        .ok_or_else(|| AdminError::table_not_found(table))
}

fn table_ref<'a>(state: &'a ClusterState, table: &str) -> AdminResult<&'a TableState> {
    state
        .tables
        .get(table)
        .ok_or_else(|| AdminError::table_not_found(table))
}

fn find_region<'a>(state: &'a mut ClusterState, encoded: &str) -> AdminResult<&'a mut RegionInfo> {
    state
        .tables
        .values_mut()
        .flat_map(|t| t.regions.iter_mut())
        .find(|r| r.encoded_name == encoded)
        .ok_or_else(|| AdminError::region_not_found(encoded))
}

impl Connection for LocalCluster {
    fn admin(&self) -> Arc<dyn Admin> {
        Arc::new(self.clone())
    }

    fn replication(&self) -> Arc<dyn ReplicationAdmin> {
        Arc::new(self.clone())
    }

    fn open_table(&self, name: &str) -> AdminResult<Box<dyn TableHandle>> {
        self.record("open_table", name)?;
        table_ref(&*self.read()?, name)?;
        self.inner.open_handles.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(LocalTable {
            cluster: self.clone(),
            name: name.to_string(),
            closed: false,
        }))
    }
}

impl Admin for LocalCluster {
    fn list_tables(&self) -> AdminResult<Vec<String>> {
        self.record("list_tables", "")?;
        Ok(self.read()?.tables.keys().cloned().collect())
    }

    fn table_exists(&self, table: &str) -> AdminResult<bool> {
        self.record("table_exists", table)?;
        Ok(self.read()?.tables.contains_key(table))
    }

    fn describe_table(&self, table: &str) -> AdminResult<TableDescriptor> {
        self.record("describe_table", table)?;
        Ok(table_ref(&*self.read()?, table)?.descriptor.clone())
    }

    fn create_table(&self, descriptor: &TableDescriptor) -> AdminResult<()> {
        self.record("create_table", &descriptor.name)?;
        let mut state = self.write()?;
        let namespace = descriptor.namespace();
        if !state.namespaces.contains(namespace) {
            return Err(AdminError::namespace_not_found(namespace));
        }
        if state.tables.contains_key(&descriptor.name) {
            return Err(AdminError::table_exists(&descriptor.name));
        }
        if descriptor.families.is_empty() {
            return Err(AdminError::other(format!(
                "Table '{}' must have at least one column family",
                descriptor.name
            )));
        }
        let region = new_region(&descriptor.name, state.live_servers.first());
        state.tables.insert(
            descriptor.name.clone(),
            TableState {
                descriptor: descriptor.clone(),
                enabled: true,
                regions: vec![region],
                rows: BTreeMap::new(),
            },
        );
        Ok(())
    }

    fn add_family(&self, table: &str, family: &FamilyDescriptor) -> AdminResult<()> {
        self.record("add_family", table)?;
        let mut state = self.write()?;
        let entry = table_mut(&mut state, table)?;
        if entry.descriptor.has_family(&family.name) {
            return Err(AdminError::other(format!(
                "Column family '{}' already exists in table '{}'",
                family.name, table
            )));
        }
        entry.descriptor.families.push(family.clone());
        Ok(())
    }

    fn delete_family(&self, table: &str, family: &str) -> AdminResult<()> {
        self.record("delete_family", table)?;
        let mut state = self.write()?;
        let entry = table_mut(&mut state, table)?;
        if !entry.descriptor.has_family(family) {
            return Err(AdminError::no_such_family(table, family));
        }
        if entry.descriptor.families.len() == 1 {
            return Err(AdminError::other(format!(
                "Cannot delete the only column family of table '{}'",
                table
            )));
        }
        entry.descriptor.families.retain(|f| f.name != family);
        let prefix = format!("{}:", family);
        for columns in entry.rows.values_mut() {
            columns.retain(|column, _| !column.starts_with(&prefix));
        }
        entry.rows.retain(|_, columns| !columns.is_empty());
        Ok(())
    }

    fn enable_table(&self, table: &str) -> AdminResult<()> {
        self.record("enable_table", table)?;
        let mut state = self.write()?;
        let entry = table_mut(&mut state, table)?;
        if entry.enabled {
            return Err(AdminError::table_not_disabled(table));
        }
        entry.enabled = true;
        Ok(())
    }

    fn disable_table(&self, table: &str) -> AdminResult<()> {
        self.record("disable_table", table)?;
        let mut state = self.write()?;
        let entry = table_mut(&mut state, table)?;
        if !entry.enabled {
            return Err(AdminError::table_not_enabled(table));
        }
        entry.enabled = false;
        Ok(())
    }

    fn is_table_enabled(&self, table: &str) -> AdminResult<bool> {
        self.record("is_table_enabled", table)?;
        Ok(table_ref(&*self.read()?, table)?.enabled)
    }

    fn drop_table(&self, table: &str) -> AdminResult<()> {
        self.record("drop_table", table)?;
        let mut state = self.write()?;
        if table_ref(&state, table)?.enabled {
            return Err(AdminError::table_not_disabled(table));
        }
        state.tables.remove(table);
        state.acl.retain(|g| g.scope.table() != Some(table));
        Ok(())
    }

    fn list_namespaces(&self) -> AdminResult<Vec<String>> {
        self.record("list_namespaces", "")?;
        Ok(self.read()?.namespaces.iter().cloned().collect())
    }

    fn namespace_exists(&self, namespace: &str) -> AdminResult<bool> {
        self.record("namespace_exists", namespace)?;
        Ok(self.read()?.namespaces.contains(namespace))
    }

    fn create_namespace(&self, namespace: &str) -> AdminResult<()> {
        self.record("create_namespace", namespace)?;
        let mut state = self.write()?;
        if !state.namespaces.insert(namespace.to_string()) {
            return Err(AdminError::namespace_exists(namespace));
        }
        Ok(())
    }

    fn drop_namespace(&self, namespace: &str) -> AdminResult<()> {
        self.record("drop_namespace", namespace)?;
        let mut state = self.write()?;
        if namespace == DEFAULT_NAMESPACE || namespace == SYSTEM_NAMESPACE {
            return Err(AdminError::other(format!(
                "Reserved namespace '{}' cannot be removed",
                namespace
            )));
        }
        if !state.namespaces.contains(namespace) {
            return Err(AdminError::namespace_not_found(namespace));
        }
        if state.tables.keys().any(|t| namespace_of(t) == namespace) {
            return Err(AdminError::namespace_not_empty(namespace));
        }
        state.namespaces.remove(namespace);
        state.acl.retain(|g| g.scope.namespace() != Some(namespace));
        Ok(())
    }

    fn list_regions(&self, table: &str) -> AdminResult<Vec<RegionInfo>> {
        self.record("list_regions", table)?;
        Ok(table_ref(&*self.read()?, table)?.regions.clone())
    }

    fn move_region(&self, encoded_name: &str, server: Option<&str>) -> AdminResult<()> {
        self.record("move_region", encoded_name)?;
        let mut state = self.write()?;
        let live = state.live_servers.clone();
        let region = find_region(&mut state, encoded_name)?;
        let destination = match server {
            Some(s) if live.iter().any(|l| l == s) => s.to_string(),
            Some(s) => {
                return Err(AdminError::other(format!("Server '{}' is not online", s)));
            }
            None => live
                .iter()
                .find(|l| region.server.as_ref() != Some(*l))
                .or_else(|| live.first())
                .cloned()
                .ok_or_else(|| AdminError::other("No live servers"))?,
        };
        region.server = Some(destination);
        Ok(())
    }

    fn assign_region(&self, encoded_name: &str) -> AdminResult<()> {
        self.record("assign_region", encoded_name)?;
        let mut state = self.write()?;
        let first = state.live_servers.first().cloned();
        let region = find_region(&mut state, encoded_name)?;
        if region.server.is_none() {
            region.server = Some(first.ok_or_else(|| AdminError::other("No live servers"))?);
        }
        Ok(())
    }

    fn unassign_region(&self, encoded_name: &str, force: bool) -> AdminResult<()> {
        self.record("unassign_region", encoded_name)?;
        let mut state = self.write()?;
        let region = find_region(&mut state, encoded_name)?;
        if region.server.is_none() && !force {
            return Err(AdminError::other(format!(
                "Region '{}' is not assigned",
                encoded_name
            )));
        }
        region.server = None;
        Ok(())
    }

    fn set_balancer(&self, enabled: bool) -> AdminResult<bool> {
        self.record("set_balancer", if enabled { "true" } else { "false" })?;
        let mut state = self.write()?;
        let previous = state.balancer_enabled;
        state.balancer_enabled = enabled;
        Ok(previous)
    }

    fn snapshot(&self, snapshot: &str, table: &str) -> AdminResult<()> {
        self.record("snapshot", snapshot)?;
        let mut state = self.write()?;
        table_ref(&state, table)?;
        if state.snapshots.iter().any(|s| s.name == snapshot) {
            return Err(AdminError::other(format!(
                "Snapshot '{}' already exists",
                snapshot
            )));
        }
        state.snapshots.push(SnapshotInfo {
            name: snapshot.to_string(),
            table: table.to_string(),
            created_at: Utc::now().timestamp_millis(),
        });
        Ok(())
    }

    fn list_snapshots(&self) -> AdminResult<Vec<SnapshotInfo>> {
        self.record("list_snapshots", "")?;
        Ok(self.read()?.snapshots.clone())
    }

    fn delete_snapshot(&self, snapshot: &str) -> AdminResult<()> {
        self.record("delete_snapshot", snapshot)?;
        let mut state = self.write()?;
        let before = state.snapshots.len();
        state.snapshots.retain(|s| s.name != snapshot);
        if state.snapshots.len() == before {
            return Err(AdminError::snapshot_not_found(snapshot));
        }
        Ok(())
    }

    fn cluster_status(&self) -> AdminResult<ClusterStatus> {
        self.record("cluster_status", "")?;
        let state = self.read()?;
        Ok(ClusterStatus {
            live_servers: state.live_servers.clone(),
            dead_servers: state.dead_servers.clone(),
            region_count: state.tables.values().map(|t| t.regions.len()).sum(),
            balancer_enabled: state.balancer_enabled,
        })
    }
}

impl ReplicationAdmin for LocalCluster {
    fn add_peer(&self, peer: &ReplicationPeer) -> AdminResult<()> {
        self.record("add_peer", &peer.id)?;
        let mut state = self.write()?;
        if state.peers.contains_key(&peer.id) {
            return Err(AdminError::peer_exists(&peer.id));
        }
        state.peers.insert(peer.id.clone(), peer.clone());
        Ok(())
    }

    fn remove_peer(&self, id: &str) -> AdminResult<()> {
        self.record("remove_peer", id)?;
        self.write()?
            .peers
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AdminError::peer_not_found(id))
    }

    fn list_peers(&self) -> AdminResult<Vec<ReplicationPeer>> {
        self.record("list_peers", "")?;
        Ok(self.read()?.peers.values().cloned().collect())
    }

    fn get_peer_state(&self, id: &str) -> AdminResult<bool> {
        self.record("get_peer_state", id)?;
        self.read()?
            .peers
            .get(id)
            .map(|p| p.enabled)
            .ok_or_else(|| AdminError::peer_not_found(id))
    }

    fn enable_peer(&self, id: &str) -> AdminResult<()> {
        self.record("enable_peer", id)?;
        let mut state = self.write()?;
        let peer = state
            .peers
            .get_mut(id)
            .ok_or_else(|| AdminError::peer_not_found(id))?;
        peer.enabled = true;
        Ok(())
    }

    fn disable_peer(&self, id: &str) -> AdminResult<()> {
        self.record("disable_peer", id)?;
        let mut state = self.write()?;
        let peer = state
            .peers
            .get_mut(id)
            .ok_or_else(|| AdminError::peer_not_found(id))?;
        peer.enabled = false;
        Ok(())
    }

    fn set_peer_table_cfs(&self, id: &str, table_cfs: Option<&TableCfs>) -> AdminResult<()> {
        self.record("set_peer_table_cfs", id)?;
        let mut state = self.write()?;
        let peer = state
            .peers
            .get_mut(id)
            .ok_or_else(|| AdminError::peer_not_found(id))?;
        peer.table_cfs = table_cfs.cloned();
        Ok(())
    }

    fn list_replicated(&self) -> AdminResult<Vec<ReplicatedFamily>> {
        self.record("list_replicated", "")?;
        let state = self.read()?;
        let mut replicated = Vec::new();
        for (name, table) in &state.tables {
            for family in table.descriptor.families.iter().filter(|f| f.is_replicated()) {
                replicated.push(ReplicatedFamily {
                    table: name.clone(),
                    family: family.name.clone(),
                    replication_type: "GLOBAL".to_string(),
                });
            }
        }
        Ok(replicated)
    }
}

/// Handle on one table of a `LocalCluster`.
struct LocalTable {
    cluster: LocalCluster,
    name: String,
    closed: bool,
}

impl LocalTable {
    fn ensure_open(&self) -> AdminResult<()> {
        if self.closed {
            return Err(AdminError::io(format!(
                "Handle on table '{}' is closed",
                self.name
            )));
        }
        Ok(())
    }

    fn check_columns(table: &TableState, name: &str, columns: &[Column]) -> AdminResult<()> {
        for column in columns {
            if !table.descriptor.has_family(&column.family) {
                return Err(AdminError::no_such_family(name, &column.family));
            }
        }
        Ok(())
    }

    fn online<'a>(state: &'a ClusterState, name: &str) -> AdminResult<&'a TableState> {
        let table = table_ref(state, name)?;
        if !table.enabled {
            return Err(AdminError::table_not_enabled(name));
        }
        Ok(table)
    }

    fn cells_of(row: &str, columns: &BTreeMap<String, StoredValue>, wanted: &[Column]) -> Vec<Cell> {
        columns
            .iter()
            .filter_map(|(column, stored)| {
                let (family, qualifier) = column.split_once(':')?;
                if !wanted.is_empty() && !wanted.iter().any(|w| w.matches(family, qualifier)) {
                    return None;
                }
                Some(Cell {
                    row: row.to_string(),
                    family: family.to_string(),
                    qualifier: qualifier.to_string(),
                    timestamp: stored.timestamp,
                    value: stored.value.clone(),
                })
            })
            .collect()
    }
}

impl TableHandle for LocalTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, row: &str, columns: &[Column]) -> AdminResult<Vec<Cell>> {
        self.ensure_open()?;
        self.cluster.record("get", &self.name)?;
        let state = self.cluster.read()?;
        let table = Self::online(&state, &self.name)?;
        Self::check_columns(table, &self.name, columns)?;
        Ok(table
            .rows
            .get(row)
            .map(|cells| Self::cells_of(row, cells, columns))
            .unwrap_or_default())
    }

    fn put(
        &self,
        row: &str,
        family: &str,
        qualifier: &str,
        value: &[u8],
        timestamp: Option<i64>,
    ) -> AdminResult<()> {
        self.ensure_open()?;
        self.cluster.record("put", &self.name)?;
        let mut state = self.cluster.write()?;
        Self::online(&state, &self.name)?;
        let table = table_mut(&mut state, &self.name)?;
        if !table.descriptor.has_family(family) {
            return Err(AdminError::no_such_family(&self.name, family));
        }
        table.rows.entry(row.to_string()).or_default().insert(
            format!("{}:{}", family, qualifier),
            StoredValue {
                timestamp: timestamp.unwrap_or_else(|| Utc::now().timestamp_millis()),
                value: value.to_vec(),
            },
        );
        Ok(())
    }

    fn delete(&self, row: &str, column: Option<&Column>) -> AdminResult<()> {
        self.ensure_open()?;
        self.cluster.record("delete", &self.name)?;
        let mut state = self.cluster.write()?;
        Self::online(&state, &self.name)?;
        let table = table_mut(&mut state, &self.name)?;
        if let Some(column) = column {
            if !table.descriptor.has_family(&column.family) {
                return Err(AdminError::no_such_family(&self.name, &column.family));
            }
        }
        if let Some(cells) = table.rows.get_mut(row) {
            match column {
                Some(c) => cells.retain(|key, _| {
                    key.split_once(':')
                        .map_or(true, |(f, q)| !c.matches(f, q))
                }),
                None => cells.clear(),
            }
            if cells.is_empty() {
                table.rows.remove(row);
            }
        }
        Ok(())
    }

    fn scan(&self, spec: &ScanSpec) -> AdminResult<Vec<Cell>> {
        self.ensure_open()?;
        self.cluster.record("scan", &self.name)?;
        let state = self.cluster.read()?;
        let table = Self::online(&state, &self.name)?;
        Self::check_columns(table, &self.name, &spec.columns)?;
        let mut cells = Vec::new();
        let mut rows = 0;
        for (row, columns) in &table.rows {
            if spec.start_row.as_deref().map_or(false, |s| row.as_str() < s) {
                continue;
            }
            if spec.stop_row.as_deref().map_or(false, |s| row.as_str() >= s) {
                break;
            }
            if spec.limit.map_or(false, |l| rows >= l) {
                break;
            }
            let row_cells = Self::cells_of(row, columns, &spec.columns);
            if !row_cells.is_empty() {
                rows += 1;
                cells.extend(row_cells);
            }
        }
        Ok(cells)
    }

    fn increment(
        &self,
        row: &str,
        family: &str,
        qualifier: &str,
        amount: i64,
    ) -> AdminResult<i64> {
        self.ensure_open()?;
        self.cluster.record("increment", &self.name)?;
        let mut state = self.cluster.write()?;
        Self::online(&state, &self.name)?;
        let table = table_mut(&mut state, &self.name)?;
        if !table.descriptor.has_family(family) {
            return Err(AdminError::no_such_family(&self.name, family));
        }
        let cells = table.rows.entry(row.to_string()).or_default();
        let key = format!("{}:{}", family, qualifier);
        let current = match cells.get(&key) {
            Some(stored) => {
                let bytes: [u8; 8] = stored.value.as_slice().try_into().map_err(|_| {
                    AdminError::other(format!(
                        "Attempted to increment field that isn't 64 bits wide: {}",
                        key
                    ))
                })?;
                i64::from_be_bytes(bytes)
            }
            None => 0,
        };
        let next = current.wrapping_add(amount);
        cells.insert(
            key,
            StoredValue {
                timestamp: Utc::now().timestamp_millis(),
                value: next.to_be_bytes().to_vec(),
            },
        );
        Ok(next)
    }

    fn access_control_service(&self) -> AdminResult<Arc<dyn AccessControlService>> {
        self.ensure_open()?;
        self.cluster.record("access_control_service", &self.name)?;
        if self.name != self.cluster.inner.acl_table {
            return Err(AdminError::no_such_service(&self.name));
        }
        Ok(Arc::new(LocalAccessControl {
            cluster: self.cluster.clone(),
        }))
    }

    fn close(&mut self) -> AdminResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.cluster.inner.open_handles.fetch_sub(1, Ordering::SeqCst);
        self.cluster.record("close_table", &self.name)
    }
}

/// Access-control endpoint backed by the cluster's ACL entries.
struct LocalAccessControl {
    cluster: LocalCluster,
}

impl LocalAccessControl {
    fn decode(actions: &[u8]) -> AdminResult<ActionSet> {
        ActionSet::from_bytes(actions).map_err(|b| {
            AdminError::other(format!("Unknown action code 0x{:02x}", b))
                .wrapped_by(super::FailureKind::Rpc, "Access control request rejected")
        })
    }
}

impl AccessControlService for LocalAccessControl {
    fn grant(&self, principal: &str, scope: &PermissionScope, actions: &[u8]) -> AdminResult<()> {
        self.cluster.record("grant", principal)?;
        let actions = Self::decode(actions)?;
        let mut state = self.cluster.write()?;
        match state
            .acl
            .iter_mut()
            .find(|g| g.principal == principal && &g.scope == scope)
        {
            Some(existing) => existing.actions = existing.actions.union(&actions),
            None => state.acl.push(PermissionGrant {
                principal: principal.to_string(),
                scope: scope.clone(),
                actions,
            }),
        }
        Ok(())
    }

    fn revoke(&self, principal: &str, scope: &PermissionScope, actions: &[u8]) -> AdminResult<()> {
        self.cluster.record("revoke", principal)?;
        let actions = Self::decode(actions)?;
        let mut state = self.cluster.write()?;
        if actions.is_empty() {
            state
                .acl
                .retain(|g| !(g.principal == principal && &g.scope == scope));
        } else {
            for grant in state
                .acl
                .iter_mut()
                .filter(|g| g.principal == principal && &g.scope == scope)
            {
                grant.actions.remove_all(&actions);
            }
            state.acl.retain(|g| !g.actions.is_empty());
        }
        Ok(())
    }

    fn get_user_permissions(&self, scope: &PermissionScope) -> AdminResult<Vec<PermissionRow>> {
        self.cluster.record("get_user_permissions", &scope.to_string())?;
        let state = self.cluster.read()?;
        Ok(state
            .acl
            .iter()
            .filter(|g| scope.includes(&g.scope))
            .map(|g| PermissionRow {
                principal: g.principal.clone(),
                scope: g.scope.clone(),
                actions: g.actions.encode(),
            })
            .collect())
    }
}
