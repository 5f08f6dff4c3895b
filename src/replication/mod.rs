//! Replication peer control
//!
//! Peers are registered, toggled and filtered through the cluster's
//! replication stub. Nothing is cached: every query re-asks the cluster.

mod manager;
mod peer;

pub use manager::ReplicationPeerManager;
pub use peer::{format_table_cfs, parse_table_cfs, validate_peer_id, ClusterKey, PeerState};
