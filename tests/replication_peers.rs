//! Replication peer manager tests

use std::sync::Arc;

use colshell::bulk::TablePattern;
use colshell::cluster::{Admin, FamilyDescriptor, LocalCluster, TableDescriptor};
use colshell::replication::{parse_table_cfs, ClusterKey, PeerState, ReplicationPeerManager};
use colshell::shell::{ErrorClassification, ErrorTranslator, ShellError};

fn setup() -> (LocalCluster, ReplicationPeerManager) {
    let cluster = LocalCluster::new();
    let manager = ReplicationPeerManager::new(Arc::new(cluster.clone()));
    (cluster, manager)
}

fn is_validation(err: &ShellError) -> bool {
    matches!(
        err,
        ShellError::Classified(ErrorClassification::Validation(_))
    )
}

// =============================================================================
// LOCAL VALIDATION
// =============================================================================

#[test]
fn test_invalid_input_issues_no_rpc() {
    let (cluster, manager) = setup();

    for (id, key, cfs) in [
        ("", "zk:2181:/hbase", None),
        ("peer-1", "zk:2181:/hbase", None),
        ("1", "", None),
        ("1", "zk:2181", None),
        ("1", "zk:port:/hbase", None),
        ("1", "zk:2181:hbase", None),
        ("1", ",zk:2181:/hbase", None),
        ("1", "zk:2181:/hbase", Some("t1:cf1:x")),
        ("1", "zk:2181:/hbase", Some(" ; ")),
    ] {
        let err = manager.add_peer(id, key, cfs).unwrap_err();
        assert!(is_validation(&err), "{:?} {:?} {:?} gave {:?}", id, key, cfs, err);
    }
    assert!(cluster.calls().is_empty());
}

#[test]
fn test_cluster_key_round_trip() {
    let key: ClusterKey = "zk1,zk2,zk3:2181:/hbase/root".parse().unwrap();
    assert_eq!(key.quorum.len(), 3);
    assert_eq!(key.port, 2181);
    assert_eq!(key.root_path, "/hbase/root");
    assert_eq!(key.to_string(), "zk1,zk2,zk3:2181:/hbase/root");
}

#[test]
fn test_table_cfs_parse() {
    let cfs = parse_table_cfs("t1; t2:cf1,cf2 ;t3:cf3").unwrap();
    assert_eq!(cfs.len(), 3);
    assert!(cfs["t1"].is_empty());
    assert_eq!(cfs["t2"], vec!["cf1".to_string(), "cf2".to_string()]);
}

// =============================================================================
// PEER LIFECYCLE
// =============================================================================

#[test]
fn test_duplicate_add_fails_and_remove_allows_reuse() {
    let (cluster, manager) = setup();
    manager.add_peer("1", "zk:2181:/hbase", None).unwrap();

    let err = manager.add_peer("1", "other:2181:/hbase", None).unwrap_err();
    let translator = ErrorTranslator::new(Arc::new(cluster.clone()), false);
    assert!(matches!(
        translator.translate(err),
        ErrorClassification::Unclassified { .. }
    ));
    assert_eq!(manager.list_peers().unwrap()["1"], "zk:2181:/hbase");

    manager.remove_peer("1").unwrap();
    assert!(manager.list_peers().unwrap().is_empty());

    manager.add_peer("1", "other:2181:/hbase", None).unwrap();
    assert_eq!(manager.list_peers().unwrap()["1"], "other:2181:/hbase");
}

#[test]
fn test_new_peer_is_enabled() {
    let (_cluster, manager) = setup();
    manager.add_peer("7", "zk:2181:/hbase", None).unwrap();
    assert_eq!(manager.get_peer_state("7").unwrap(), PeerState::Enabled);

    manager.disable_peer("7").unwrap();
    assert_eq!(manager.get_peer_state("7").unwrap().to_string(), "DISABLED");

    manager.enable_peer("7").unwrap();
    assert_eq!(manager.get_peer_state("7").unwrap(), PeerState::Enabled);
}

#[test]
fn test_queries_always_reach_cluster() {
    let (cluster, manager) = setup();
    manager.add_peer("1", "zk:2181:/hbase", None).unwrap();
    manager.list_peers().unwrap();
    manager.list_peers().unwrap();
    manager.get_peer_state("1").unwrap();
    manager.get_peer_state("1").unwrap();

    assert_eq!(cluster.call_count("list_peers"), 2);
    assert_eq!(cluster.call_count("get_peer_state"), 2);
}

#[test]
fn test_unknown_peer_passes_through() {
    let (_cluster, manager) = setup();
    let err = manager.get_peer_state("9").unwrap_err();
    assert!(matches!(err, ShellError::Admin(_)));
}

#[test]
fn test_set_and_show_table_cfs() {
    let (_cluster, manager) = setup();
    manager.add_peer("1", "zk:2181:/hbase", Some("t2:cf1,cf2; t1")).unwrap();
    assert_eq!(manager.show_peer_table_cfs("1").unwrap(), "t1; t2:cf1,cf2");

    manager.set_peer_table_cfs("1", Some("t3")).unwrap();
    assert_eq!(manager.show_peer_table_cfs("1").unwrap(), "t3");

    manager.set_peer_table_cfs("1", None).unwrap();
    assert_eq!(manager.show_peer_table_cfs("1").unwrap(), "");
    assert!(manager.peers().unwrap()[0].table_cfs.is_none());
}

// =============================================================================
// REPLICATED TABLES
// =============================================================================

#[test]
fn test_list_replicated_tables_filters_by_pattern() {
    let (cluster, manager) = setup();
    cluster
        .create_table(
            &TableDescriptor::new("orders")
                .with_family(FamilyDescriptor::new("d").replicated())
                .with_family(FamilyDescriptor::new("tmp")),
        )
        .unwrap();
    cluster
        .create_table(&TableDescriptor::new("users").with_family(FamilyDescriptor::new("p").replicated()))
        .unwrap();

    let all = manager.list_replicated_tables(None).unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|f| f.replication_type == "GLOBAL"));

    let orders = manager
        .list_replicated_tables(Some(&TablePattern::from("ord.*")))
        .unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!((orders[0].table.as_str(), orders[0].family.as_str()), ("orders", "d"));

    let err = manager
        .list_replicated_tables(Some(&TablePattern::from("(")))
        .unwrap_err();
    assert!(is_validation(&err));
}
