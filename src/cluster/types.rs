//! Values exchanged with the cluster collaborator layer

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Default number of versions kept per cell.
pub const DEFAULT_MAX_VERSIONS: u32 = 1;

/// Replication scope value marking a family as replicated to peers.
pub const REPLICATION_SCOPE_GLOBAL: u8 = 1;

/// Column family definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyDescriptor {
    pub name: String,

    #[serde(default = "default_max_versions")]
    pub max_versions: u32,

    /// 0 = local only, 1 = replicated.
    #[serde(default)]
    pub replication_scope: u8,
}

fn default_max_versions() -> u32 {
    DEFAULT_MAX_VERSIONS
}

impl FamilyDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_versions: DEFAULT_MAX_VERSIONS,
            replication_scope: 0,
        }
    }

    pub fn replicated(mut self) -> Self {
        self.replication_scope = REPLICATION_SCOPE_GLOBAL;
        self
    }

    pub fn is_replicated(&self) -> bool {
        self.replication_scope != 0
    }
}

/// Table definition: a name and its column families.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    pub families: Vec<FamilyDescriptor>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            families: Vec::new(),
        }
    }

    pub fn with_family(mut self, family: FamilyDescriptor) -> Self {
        self.families.push(family);
        self
    }

    pub fn family_names(&self) -> Vec<String> {
        self.families.iter().map(|f| f.name.clone()).collect()
    }

    pub fn has_family(&self, family: &str) -> bool {
        self.families.iter().any(|f| f.name == family)
    }

    /// Namespace part of the table name (`default` when unqualified).
    pub fn namespace(&self) -> &str {
        namespace_of(&self.name)
    }
}

/// Namespace part of a `namespace:qualifier` table name.
pub fn namespace_of(table: &str) -> &str {
    match table.split_once(':') {
        Some((ns, _)) => ns,
        None => "default",
    }
}

/// `family` or `family:qualifier` column address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Column {
    pub family: String,
    pub qualifier: Option<String>,
}

impl Column {
    /// Parse `family[:qualifier]`. Returns `None` for an empty family.
    pub fn parse(spec: &str) -> Option<Self> {
        let (family, qualifier) = match spec.split_once(':') {
            Some((f, q)) => (f, Some(q.to_string())),
            None => (spec, None),
        };
        if family.is_empty() {
            return None;
        }
        Some(Self {
            family: family.to_string(),
            qualifier,
        })
    }

    pub fn matches(&self, family: &str, qualifier: &str) -> bool {
        self.family == family && self.qualifier.as_deref().map_or(true, |q| q == qualifier)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{}:{}", self.family, q),
            None => write!(f, "{}", self.family),
        }
    }
}

/// A single stored cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub row: String,
    pub family: String,
    pub qualifier: String,
    pub timestamp: i64,
    pub value: Vec<u8>,
}

impl Cell {
    pub fn column(&self) -> String {
        format!("{}:{}", self.family, self.qualifier)
    }
}

/// Row range and limit for a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSpec {
    pub start_row: Option<String>,
    pub stop_row: Option<String>,
    pub columns: Vec<Column>,
    /// Maximum number of rows returned.
    pub limit: Option<usize>,
}

impl ScanSpec {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }
}

/// A region and the server currently hosting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionInfo {
    pub encoded_name: String,
    pub table: String,
    #[serde(default)]
    pub start_key: String,
    #[serde(default)]
    pub end_key: String,
    /// `None` while unassigned.
    #[serde(default)]
    pub server: Option<String>,
}

/// Cluster-wide status summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterStatus {
    pub live_servers: Vec<String>,
    pub dead_servers: Vec<String>,
    pub region_count: usize,
    pub balancer_enabled: bool,
}

impl ClusterStatus {
    pub fn average_load(&self) -> f64 {
        if self.live_servers.is_empty() {
            0.0
        } else {
            self.region_count as f64 / self.live_servers.len() as f64
        }
    }
}

/// A completed table snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    pub name: String,
    pub table: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

/// Per-peer filter: table name to replicated families (empty = all).
pub type TableCfs = BTreeMap<String, Vec<String>>;

/// A registered replication destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationPeer {
    pub id: String,
    pub cluster_key: String,
    pub enabled: bool,
    #[serde(default)]
    pub table_cfs: Option<TableCfs>,
}

/// A column family whose edits are shipped to peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicatedFamily {
    pub table: String,
    pub family: String,
    pub replication_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_parse() {
        let c = Column::parse("cf:q1").unwrap();
        assert_eq!(c.family, "cf");
        assert_eq!(c.qualifier.as_deref(), Some("q1"));

        let f = Column::parse("cf").unwrap();
        assert!(f.qualifier.is_none());
        assert!(f.matches("cf", "anything"));

        assert!(Column::parse("").is_none());
        assert!(Column::parse(":q").is_none());
    }

    #[test]
    fn test_namespace_of() {
        assert_eq!(namespace_of("ns1:t"), "ns1");
        assert_eq!(namespace_of("t"), "default");
    }

    #[test]
    fn test_average_load() {
        let status = ClusterStatus {
            live_servers: vec!["a".into(), "b".into()],
            dead_servers: vec![],
            region_count: 5,
            balancer_enabled: true,
        };
        assert!((status.average_load() - 2.5).abs() < f64::EPSILON);
    }
}
