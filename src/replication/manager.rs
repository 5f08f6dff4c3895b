//! Peer registration and filters

use std::collections::BTreeMap;
use std::sync::Arc;

use super::peer::{format_table_cfs, parse_table_cfs, validate_peer_id, ClusterKey, PeerState};
use crate::bulk::TablePattern;
use crate::cluster::{AdminError, ReplicatedFamily, ReplicationAdmin, ReplicationPeer};
use crate::observability::ObservationScope;
use crate::shell::{ShellError, ShellResult};

/// Stateless pass-through to the replication stub with local validation.
pub struct ReplicationPeerManager {
    replication: Arc<dyn ReplicationAdmin>,
}

impl ReplicationPeerManager {
    pub fn new(replication: Arc<dyn ReplicationAdmin>) -> Self {
        Self { replication }
    }

    /// Register an enabled peer. A duplicate id is rejected by the cluster.
    pub fn add_peer(&self, id: &str, cluster_key: &str, table_cfs: Option<&str>) -> ShellResult<()> {
        validate_peer_id(id)?;
        let key: ClusterKey = cluster_key.parse()?;
        let table_cfs = table_cfs.map(parse_table_cfs).transpose()?;

        let observation = ObservationScope::with_fields("ADD_PEER", &[("peer", id)]);
        let peer = ReplicationPeer {
            id: id.to_string(),
            cluster_key: key.to_string(),
            enabled: true,
            table_cfs,
        };
        match self.replication.add_peer(&peer) {
            Ok(()) => {
                observation.complete();
                Ok(())
            }
            Err(err) => {
                observation.fail(err.message());
                Err(err.into())
            }
        }
    }

    pub fn remove_peer(&self, id: &str) -> ShellResult<()> {
        require_id(id)?;
        Ok(self.replication.remove_peer(id)?)
    }

    /// Peer id → cluster key.
    pub fn list_peers(&self) -> ShellResult<BTreeMap<String, String>> {
        Ok(self
            .peers()?
            .into_iter()
            .map(|p| (p.id, p.cluster_key))
            .collect())
    }

    pub fn peers(&self) -> ShellResult<Vec<ReplicationPeer>> {
        Ok(self.replication.list_peers()?)
    }

    pub fn get_peer_state(&self, id: &str) -> ShellResult<PeerState> {
        require_id(id)?;
        Ok(PeerState::from_enabled(self.replication.get_peer_state(id)?))
    }

    pub fn enable_peer(&self, id: &str) -> ShellResult<()> {
        require_id(id)?;
        Ok(self.replication.enable_peer(id)?)
    }

    pub fn disable_peer(&self, id: &str) -> ShellResult<()> {
        require_id(id)?;
        Ok(self.replication.disable_peer(id)?)
    }

    /// Replicated families, optionally restricted to tables matching `pattern`.
    pub fn list_replicated_tables(
        &self,
        pattern: Option<&TablePattern>,
    ) -> ShellResult<Vec<ReplicatedFamily>> {
        let regex = pattern.map(TablePattern::regex).transpose()?;
        let families = self.replication.list_replicated()?;
        Ok(match regex {
            Some(regex) => families
                .into_iter()
                .filter(|f| regex.is_match(&f.table))
                .collect(),
            None => families,
        })
    }

    /// Replace the peer's filter; `None` replicates every table.
    pub fn set_peer_table_cfs(&self, id: &str, table_cfs: Option<&str>) -> ShellResult<()> {
        require_id(id)?;
        let table_cfs = table_cfs.map(parse_table_cfs).transpose()?;
        Ok(self.replication.set_peer_table_cfs(id, table_cfs.as_ref())?)
    }

    /// The peer's filter as text; empty when every table is replicated.
    pub fn show_peer_table_cfs(&self, id: &str) -> ShellResult<String> {
        require_id(id)?;
        let peer = self
            .peers()?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| AdminError::peer_not_found(id))?;
        Ok(peer.table_cfs.as_ref().map(format_table_cfs).unwrap_or_default())
    }
}

fn require_id(id: &str) -> ShellResult<()> {
    if id.is_empty() {
        return Err(ShellError::validation("Peer id must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::LocalCluster;

    fn manager() -> (LocalCluster, ReplicationPeerManager) {
        let cluster = LocalCluster::new();
        let manager = ReplicationPeerManager::new(Arc::new(cluster.clone()));
        (cluster, manager)
    }

    #[test]
    fn test_invalid_key_issues_no_call() {
        let (cluster, manager) = manager();
        assert!(manager.add_peer("1", "zk:abc:/hbase", None).is_err());
        assert_eq!(cluster.call_count("add_peer"), 0);
    }

    #[test]
    fn test_state_round_trip() {
        let (_cluster, manager) = manager();
        manager.add_peer("1", "zk:2181:/hbase", None).unwrap();
        assert_eq!(manager.get_peer_state("1").unwrap(), PeerState::Enabled);
        manager.disable_peer("1").unwrap();
        assert_eq!(manager.get_peer_state("1").unwrap(), PeerState::Disabled);
    }

    #[test]
    fn test_table_cfs_show_and_clear() {
        let (_cluster, manager) = manager();
        manager.add_peer("1", "zk:2181:/hbase", Some("t1:cf1")).unwrap();
        assert_eq!(manager.show_peer_table_cfs("1").unwrap(), "t1:cf1");
        manager.set_peer_table_cfs("1", None).unwrap();
        assert_eq!(manager.show_peer_table_cfs("1").unwrap(), "");
    }

    #[test]
    fn test_list_peers_map() {
        let (_cluster, manager) = manager();
        manager.add_peer("2", "zk:2181:/b", None).unwrap();
        manager.add_peer("1", "zk:2181:/a", None).unwrap();
        let peers = manager.list_peers().unwrap();
        assert_eq!(peers.keys().collect::<Vec<_>>(), vec!["1", "2"]);
        assert_eq!(peers["1"], "zk:2181:/a");
    }
}
