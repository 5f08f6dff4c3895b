//! Error translation tests
//!
//! Failures are classified on the deepest cause of their chain; the debug
//! flag alone decides whether unclassified failures carry a backtrace.

use std::sync::Arc;

use colshell::cluster::{
    Admin, AdminError, FailureKind, FamilyDescriptor, LocalCluster, TableDescriptor,
};
use colshell::shell::{
    CommandDispatcher, EntityKind, ErrorClassification, ErrorTranslator, Formatter, Session,
    ShellError,
};

fn cluster() -> LocalCluster {
    let cluster = LocalCluster::new();
    cluster
        .create_table(&TableDescriptor::new("t1").with_family(FamilyDescriptor::new("cf1")))
        .unwrap();
    cluster
}

fn translator(cluster: &LocalCluster, debug: bool) -> ErrorTranslator {
    ErrorTranslator::new(Arc::new(cluster.clone()), debug)
}

// =============================================================================
// CAUSE CHAIN
// =============================================================================

#[test]
fn test_classifies_on_deepest_cause() {
    let c = AdminError::table_not_found("t9");
    let b = c.wrapped_by(FailureKind::Rpc, "remote invocation failed");
    let a = b.wrapped_by(FailureKind::Io, "request aborted");
    assert_eq!(a.chain().count(), 3);

    let classification = translator(&cluster(), false).translate(ShellError::Admin(a));
    assert_eq!(
        classification,
        ErrorClassification::not_found(EntityKind::Table, "t9")
    );
}

#[test]
fn test_outer_category_is_ignored() {
    // the outer link looks like a known category, the root does not
    let err = AdminError::other("quota exceeded")
        .wrapped_by(FailureKind::TableExists("t1".into()), "create failed");

    let classification = translator(&cluster(), false).classify(&err);
    assert_eq!(
        classification,
        ErrorClassification::Unclassified {
            message: "quota exceeded".into(),
            backtrace: None,
        }
    );
}

#[test]
fn test_table_exists_is_already_exists() {
    let err = AdminError::table_exists("t1").wrapped_by(FailureKind::Rpc, "call failed");
    let classification = translator(&cluster(), false).classify(&err);
    assert_eq!(classification, ErrorClassification::AlreadyExists("t1".into()));
    assert_eq!(classification.to_string(), "Table already exists: t1!");
}

#[test]
fn test_family_list_reflects_current_descriptor() {
    let cluster = cluster();
    let err = AdminError::no_such_family("t1", "x");
    cluster.add_family("t1", &FamilyDescriptor::new("cf2")).unwrap();

    let classification = translator(&cluster, false).classify(&err);
    assert_eq!(
        classification,
        ErrorClassification::ColumnFamilyNotFound {
            family: "x".into(),
            valid_families: vec!["cf1".into(), "cf2".into()],
        }
    );
    assert!(classification.to_string().contains("cf1:*, cf2:*"));
}

#[test]
fn test_locally_classified_failures_pass_through() {
    let translator = translator(&cluster(), true);
    for classification in [
        ErrorClassification::SecurityUnavailable,
        ErrorClassification::Validation("bad input".into()),
        ErrorClassification::not_found(EntityKind::Namespace, "ns"),
    ] {
        assert_eq!(
            translator.translate(ShellError::Classified(classification.clone())),
            classification
        );
    }
}

// =============================================================================
// DEBUG BACKTRACE
// =============================================================================

fn traced_failure() -> AdminError {
    AdminError::other("region server aborted")
        .with_trace(["RegionServer.abort(RegionServer:412)", "Handler.run(Handler:88)"])
        .wrapped_by(FailureKind::Rpc, "call failed")
}

#[test]
fn test_backtrace_only_in_debug() {
    let cluster = cluster();

    let quiet = translator(&cluster, false).classify(&traced_failure());
    assert!(quiet.backtrace().is_none());
    assert_eq!(quiet.to_string(), "region server aborted");

    let loud = translator(&cluster, true).classify(&traced_failure());
    assert_eq!(
        loud.backtrace().unwrap(),
        &[
            "RegionServer.abort(RegionServer:412)".to_string(),
            "Handler.run(Handler:88)".to_string(),
        ]
    );
}

#[test]
fn test_rendered_error_block() {
    for debug in [false, true] {
        let cluster = cluster();
        cluster.inject_failure("cluster_status", traced_failure());
        let (formatter, buffer) = Formatter::buffered();
        let mut session = Session::new(Arc::new(cluster))
            .with_formatter(formatter)
            .with_debug(debug);

        let result = CommandDispatcher::default()
            .run(&mut session, "status", &[])
            .unwrap();
        assert!(!result.is_success());

        let out = buffer.contents();
        assert!(out.starts_with("ERROR: region server aborted\n"));
        assert_eq!(out.contains("Backtrace:"), debug);
        assert_eq!(out.contains("\tHandler.run(Handler:88)"), debug);
        assert!(out.contains("Here is some help for this command:\nUsage: status"));
    }
}
