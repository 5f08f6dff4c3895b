//! Command handlers
//!
//! One arm per [`CommandKind`]. Handlers check arguments locally, call the
//! collaborator traits and shape the result. Raw cluster failures are
//! returned untranslated; the dispatcher classifies them.

use chrono::{TimeZone, Utc};

use super::commands::{Command, CommandKind};
use super::errors::{EntityKind, ShellError, ShellResult};
use super::format::{escape_bytes, unescape_bytes};
use super::session::Session;
use super::table::TableRef;
use super::types::CommandOutput;
use crate::bulk::{BulkOperation, TablePattern};
use crate::cluster::{namespace_of, Cell, Column, FamilyDescriptor, ScanSpec, TableDescriptor};
use crate::replication::format_table_cfs;
use crate::security::{PermissionScope, PermissionTarget};

/// Run `command` with positional `args`.
pub fn execute(
    command: &Command,
    session: &mut Session,
    args: &[String],
) -> ShellResult<CommandOutput> {
    let args = Args::check(command, args)?;

    match command.kind {
        // ===== GENERAL =====
        CommandKind::Status => {
            let status = session.admin().cluster_status()?;
            Ok(CommandOutput::value(format!(
                "{} live servers, {} dead servers, {} regions, {:.4} average load, balancer {}",
                status.live_servers.len(),
                status.dead_servers.len(),
                status.region_count,
                status.average_load(),
                if status.balancer_enabled { "on" } else { "off" }
            )))
        }
        CommandKind::Version => Ok(CommandOutput::value(env!("CARGO_PKG_VERSION"))),
        CommandKind::Whoami => Ok(CommandOutput::value(session.user())),

        // ===== DDL =====
        CommandKind::Create => {
            let descriptor = args
                .rest(1)
                .iter()
                .fold(TableDescriptor::new(args.get(0)), |d, f| {
                    d.with_family(FamilyDescriptor::new(f.as_str()))
                });
            session.admin().create_table(&descriptor)?;
            Ok(CommandOutput::Table(TableRef::open(
                session.connection(),
                &descriptor.name,
            )?))
        }
        CommandKind::Alter => {
            let table = args.get(0);
            match args.opt(2) {
                Some(family) if args.get(1) == "delete" => {
                    session.admin().delete_family(table, family)?;
                }
                Some(_) => {
                    return Err(ShellError::validation(format!(
                        "Unknown alter method '{}'; usage: {}",
                        args.get(1),
                        command.usage
                    )));
                }
                None => {
                    session
                        .admin()
                        .add_family(table, &FamilyDescriptor::new(args.get(1)))?;
                }
            }
            Ok(CommandOutput::Empty)
        }
        CommandKind::Describe => {
            let descriptor = session.admin().describe_table(args.get(0))?;
            let rows = descriptor
                .families
                .iter()
                .map(|f| {
                    vec![
                        f.name.clone(),
                        f.max_versions.to_string(),
                        f.replication_scope.to_string(),
                    ]
                })
                .collect();
            Ok(CommandOutput::rows(["FAMILY", "VERSIONS", "REPLICATION_SCOPE"], rows))
        }
        CommandKind::Exists => {
            let table = args.get(0);
            let exists = session.admin().table_exists(table)?;
            Ok(CommandOutput::value(format!(
                "Table {} {}",
                table,
                if exists { "does exist" } else { "does not exist" }
            )))
        }
        CommandKind::List => {
            let names = session.admin().list_tables()?;
            let matched = pattern_or_all(args.opt(0)).filter(names)?;
            Ok(single_column("TABLE", matched))
        }
        CommandKind::Enable => {
            session.admin().enable_table(args.get(0))?;
            Ok(CommandOutput::Empty)
        }
        CommandKind::Disable => {
            session.admin().disable_table(args.get(0))?;
            Ok(CommandOutput::Empty)
        }
        CommandKind::IsEnabled => Ok(CommandOutput::value(
            session.admin().is_table_enabled(args.get(0))?,
        )),
        CommandKind::IsDisabled => Ok(CommandOutput::value(
            !session.admin().is_table_enabled(args.get(0))?,
        )),
        CommandKind::Drop => {
            session.admin().drop_table(args.get(0))?;
            Ok(CommandOutput::Empty)
        }
        CommandKind::Truncate => {
            let admin = session.admin();
            let table = args.get(0);
            let descriptor = admin.describe_table(table)?;
            if admin.is_table_enabled(table)? {
                admin.disable_table(table)?;
            }
            admin.drop_table(table)?;
            admin.create_table(&descriptor)?;
            Ok(CommandOutput::Empty)
        }
        CommandKind::GetTable => Ok(CommandOutput::Table(TableRef::open(
            session.connection(),
            args.get(0),
        )?)),
        CommandKind::EnableAll => bulk(session, BulkOperation::Enable, args.get(0)),
        CommandKind::DisableAll => bulk(session, BulkOperation::Disable, args.get(0)),
        CommandKind::DropAll => bulk(session, BulkOperation::Drop, args.get(0)),

        // ===== NAMESPACE =====
        CommandKind::CreateNamespace => {
            session.admin().create_namespace(args.get(0))?;
            Ok(CommandOutput::Empty)
        }
        CommandKind::DropNamespace => {
            session.admin().drop_namespace(args.get(0))?;
            Ok(CommandOutput::Empty)
        }
        CommandKind::ListNamespace => {
            let names = session.admin().list_namespaces()?;
            let matched = pattern_or_all(args.opt(0)).filter(names)?;
            Ok(single_column("NAMESPACE", matched))
        }
        CommandKind::ListNamespaceTables => {
            let admin = session.admin();
            let namespace = args.get(0);
            if !admin.namespace_exists(namespace)? {
                return Err(ShellError::not_found(EntityKind::Namespace, namespace));
            }
            let tables = admin
                .list_tables()?
                .into_iter()
                .filter(|t| namespace_of(t) == namespace)
                .collect();
            Ok(single_column("TABLE", tables))
        }

        // ===== DML =====
        CommandKind::Get => {
            let table = TableRef::open(session.connection(), args.get(0))?;
            let columns = args
                .rest(2)
                .iter()
                .map(|c| parse_column(c))
                .collect::<ShellResult<Vec<_>>>()?;
            let rows = table
                .get(args.get(1), &columns)?
                .iter()
                .map(|c| vec![c.column(), cell_text(c)])
                .collect();
            Ok(CommandOutput::rows(["COLUMN", "CELL"], rows))
        }
        CommandKind::Put => {
            let table = TableRef::open(session.connection(), args.get(0))?;
            let column = parse_column(args.get(2))?;
            let timestamp = args.opt(4).map(|t| parse_number::<i64>("timestamp", t)).transpose()?;
            table.put(args.get(1), &column, &unescape_bytes(args.get(3)), timestamp)?;
            Ok(CommandOutput::Empty)
        }
        CommandKind::Delete => {
            let table = TableRef::open(session.connection(), args.get(0))?;
            table.delete(args.get(1), &parse_column(args.get(2))?)?;
            Ok(CommandOutput::Empty)
        }
        CommandKind::DeleteAll => {
            let table = TableRef::open(session.connection(), args.get(0))?;
            table.delete_all(args.get(1))?;
            Ok(CommandOutput::Empty)
        }
        CommandKind::Scan => {
            let table = TableRef::open(session.connection(), args.get(0))?;
            let spec = match args.opt(1) {
                Some(limit) => ScanSpec::with_limit(parse_number::<usize>("limit", limit)?),
                None => ScanSpec::default(),
            };
            let rows = table
                .scan(&spec)?
                .iter()
                .map(|c| vec![c.row.clone(), format!("column={}, {}", c.column(), cell_text(c))])
                .collect();
            Ok(CommandOutput::rows(["ROW", "COLUMN+CELL"], rows))
        }
        CommandKind::Count => {
            let table = TableRef::open(session.connection(), args.get(0))?;
            Ok(CommandOutput::value(table.count()?))
        }
        CommandKind::Incr => {
            let table = TableRef::open(session.connection(), args.get(0))?;
            let column = parse_column(args.get(2))?;
            let amount = match args.opt(3) {
                Some(a) => parse_number::<i64>("amount", a)?,
                None => 1,
            };
            let value = table.incr(args.get(1), &column, amount)?;
            Ok(CommandOutput::value(format!("COUNTER VALUE = {}", value)))
        }
        CommandKind::GetCounter => {
            let table = TableRef::open(session.connection(), args.get(0))?;
            let column = parse_column(args.get(2))?;
            Ok(CommandOutput::value(match table.get_counter(args.get(1), &column)? {
                Some(value) => format!("COUNTER VALUE = {}", value),
                None => "No counter found at specified coordinates".to_string(),
            }))
        }

        // ===== TOOLS =====
        CommandKind::Move => {
            session.admin().move_region(args.get(0), args.opt(1))?;
            Ok(CommandOutput::Empty)
        }
        CommandKind::Assign => {
            session.admin().assign_region(args.get(0))?;
            Ok(CommandOutput::Empty)
        }
        CommandKind::Unassign => {
            let force = args.opt(1).map(parse_bool).transpose()?.unwrap_or(false);
            session.admin().unassign_region(args.get(0), force)?;
            Ok(CommandOutput::Empty)
        }
        CommandKind::BalanceSwitch => {
            let previous = session.admin().set_balancer(parse_bool(args.get(0))?)?;
            Ok(CommandOutput::value(format!("Previous balancer state : {}", previous)))
        }
        CommandKind::ListRegions => {
            let rows = session
                .admin()
                .list_regions(args.get(0))?
                .into_iter()
                .map(|r| {
                    vec![
                        r.encoded_name,
                        r.start_key,
                        r.end_key,
                        r.server.unwrap_or_else(|| "-".to_string()),
                    ]
                })
                .collect();
            Ok(CommandOutput::rows(["REGION", "START_KEY", "END_KEY", "SERVER"], rows))
        }

        // ===== SNAPSHOTS =====
        CommandKind::Snapshot => {
            session.admin().snapshot(args.get(1), args.get(0))?;
            Ok(CommandOutput::Empty)
        }
        CommandKind::ListSnapshots => {
            let snapshots = session.admin().list_snapshots()?;
            let regex = pattern_or_all(args.opt(0)).regex()?;
            let rows = snapshots
                .into_iter()
                .filter(|s| regex.is_match(&s.name))
                .map(|s| vec![s.name, s.table, creation_time(s.created_at)])
                .collect();
            Ok(CommandOutput::rows(["SNAPSHOT", "TABLE", "CREATION TIME"], rows))
        }
        CommandKind::DeleteSnapshot => {
            session.admin().delete_snapshot(args.get(0))?;
            Ok(CommandOutput::Empty)
        }

        // ===== REPLICATION =====
        CommandKind::AddPeer => {
            session
                .replication()
                .add_peer(args.get(0), args.get(1), args.opt(2))?;
            Ok(CommandOutput::Empty)
        }
        CommandKind::RemovePeer => {
            session.replication().remove_peer(args.get(0))?;
            Ok(CommandOutput::Empty)
        }
        CommandKind::ListPeers => {
            let rows = session
                .replication()
                .peers()?
                .into_iter()
                .map(|p| {
                    vec![
                        p.id,
                        p.cluster_key,
                        if p.enabled { "ENABLED" } else { "DISABLED" }.to_string(),
                        p.table_cfs.as_ref().map(format_table_cfs).unwrap_or_default(),
                    ]
                })
                .collect();
            Ok(CommandOutput::rows(["PEER_ID", "CLUSTER_KEY", "STATE", "TABLE_CFS"], rows))
        }
        CommandKind::EnablePeer => {
            session.replication().enable_peer(args.get(0))?;
            Ok(CommandOutput::Empty)
        }
        CommandKind::DisablePeer => {
            session.replication().disable_peer(args.get(0))?;
            Ok(CommandOutput::Empty)
        }
        CommandKind::GetPeerState => Ok(CommandOutput::value(
            session.replication().get_peer_state(args.get(0))?,
        )),
        CommandKind::ListReplicatedTables => {
            let pattern = args.opt(0).map(TablePattern::from);
            let rows = session
                .replication()
                .list_replicated_tables(pattern.as_ref())?
                .into_iter()
                .map(|f| vec![format!("{}:{}", f.table, f.family), f.replication_type])
                .collect();
            Ok(CommandOutput::rows(["TABLE:COLUMNFAMILY", "ReplicationType"], rows))
        }
        CommandKind::SetPeerTableCfs => {
            session
                .replication()
                .set_peer_table_cfs(args.get(0), args.opt(1))?;
            Ok(CommandOutput::Empty)
        }
        CommandKind::ShowPeerTableCfs => Ok(CommandOutput::value(
            session.replication().show_peer_table_cfs(args.get(0))?,
        )),

        // ===== SECURITY =====
        CommandKind::Grant => {
            let target = PermissionTarget::from_args(args.rest(2));
            session
                .permissions()
                .grant_codes(args.get(0), args.get(1), &target)?;
            Ok(CommandOutput::Empty)
        }
        CommandKind::Revoke => {
            let target = PermissionTarget::from_args(args.rest(1));
            session.permissions().revoke(args.get(0), &target)?;
            Ok(CommandOutput::Empty)
        }
        CommandKind::UserPermission => {
            let target = PermissionTarget::from_args(args.rest(0));
            let mut rows = Vec::new();
            session.permissions().for_each_permission(&target, |grant| {
                rows.push(vec![
                    grant.principal.clone(),
                    format!(
                        "{}: [Permission: actions={}]",
                        scope_path(&grant.scope),
                        grant.actions
                    ),
                ]);
            })?;
            Ok(CommandOutput::rows(
                ["User", "Namespace,Table,Family,Qualifier:Permission"],
                rows,
            ))
        }
    }
}

/// Positional arguments whose count already matched the command's arity.
struct Args<'a> {
    values: &'a [String],
}

impl<'a> Args<'a> {
    fn check(command: &Command, values: &'a [String]) -> ShellResult<Self> {
        if !command.accepts(values.len()) {
            let expected = match command.max_args {
                Some(max) if max == command.min_args => max.to_string(),
                Some(max) => format!("{} to {}", command.min_args, max),
                None => format!("at least {}", command.min_args),
            };
            return Err(ShellError::validation(format!(
                "wrong number of arguments for '{}' (given {}, expected {}); usage: {}",
                command.name,
                values.len(),
                expected,
                command.usage
            )));
        }
        Ok(Self { values })
    }

    /// Required argument; arity is checked before any handler runs.
    fn get(&self, index: usize) -> &'a str {
        self.opt(index).unwrap_or_default()
    }

    fn opt(&self, index: usize) -> Option<&'a str> {
        self.values.get(index).map(String::as_str)
    }

    fn rest(&self, from: usize) -> &'a [String] {
        self.values.get(from..).unwrap_or_default()
    }
}

fn bulk(session: &mut Session, operation: BulkOperation, pattern: &str) -> ShellResult<CommandOutput> {
    let coordinator = session.bulk();
    let report = coordinator.apply(operation, &TablePattern::from(pattern), session.confirmer_mut())?;
    Ok(CommandOutput::Bulk(report))
}

fn pattern_or_all(pattern: Option<&str>) -> TablePattern {
    TablePattern::from(pattern.unwrap_or(".*"))
}

fn single_column(header: &str, values: Vec<String>) -> CommandOutput {
    CommandOutput::rows([header], values.into_iter().map(|v| vec![v]).collect())
}

fn parse_column(spec: &str) -> ShellResult<Column> {
    Column::parse(spec).ok_or_else(|| {
        ShellError::validation(format!(
            "Invalid column '{}'; expected family[:qualifier]",
            spec
        ))
    })
}

fn parse_number<T: std::str::FromStr>(what: &str, text: &str) -> ShellResult<T> {
    text.parse()
        .map_err(|_| ShellError::validation(format!("Invalid {} '{}'", what, text)))
}

fn parse_bool(text: &str) -> ShellResult<bool> {
    match text {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ShellError::validation(format!(
            "Expected true or false, got '{}'",
            other
        ))),
    }
}

fn cell_text(cell: &Cell) -> String {
    format!("timestamp={}, value={}", cell.timestamp, escape_bytes(&cell.value))
}

fn creation_time(millis: i64) -> String {
    match Utc.timestamp_millis_opt(millis).single() {
        Some(ts) => ts.to_rfc3339(),
        None => millis.to_string(),
    }
}

/// `namespace,table,family,qualifier` with empty parts where the scope has none.
fn scope_path(scope: &PermissionScope) -> String {
    let namespace = match scope {
        PermissionScope::Cluster => "",
        PermissionScope::Namespace { namespace } => namespace.as_str(),
        _ => scope.table().map(namespace_of).unwrap_or(""),
    };
    format!(
        "{},{},{},{}",
        namespace,
        scope.table().unwrap_or(""),
        scope.family().unwrap_or(""),
        scope.qualifier().unwrap_or("")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::commands::CommandRegistry;
    use crate::shell::ErrorClassification;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_arity_message_names_usage() {
        let drop = CommandRegistry::standard().lookup("drop").unwrap();
        let values = args(&[]);
        let err = Args::check(drop, &values).err().unwrap();
        match err {
            ShellError::Classified(ErrorClassification::Validation(msg)) => {
                assert!(msg.contains("given 0, expected 1"));
                assert!(msg.contains("usage: drop <table>"));
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_arity_open_ended() {
        let create = CommandRegistry::standard().lookup("create").unwrap();
        let values = args(&["t"]);
        let err = Args::check(create, &values).err().unwrap();
        assert!(err.to_string().contains("expected at least 2"));
    }

    #[test]
    fn test_args_rest() {
        let values = args(&["bob", "RW", "t1"]);
        let a = Args { values: &values };
        assert_eq!(a.rest(2).len(), 1);
        assert!(a.rest(5).is_empty());
        assert_eq!(a.opt(3), None);
    }

    #[test]
    fn test_parse_column_rejects_empty_family() {
        assert!(parse_column(":q").is_err());
        assert_eq!(parse_column("f:q").unwrap().family, "f");
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true").unwrap());
        assert!(!parse_bool("false").unwrap());
        assert!(parse_bool("yes").is_err());
    }

    #[test]
    fn test_scope_path() {
        let scope = PermissionScope::Family {
            table: "ns1:t".into(),
            family: "f".into(),
        };
        assert_eq!(scope_path(&scope), "ns1,ns1:t,f,");
        assert_eq!(scope_path(&PermissionScope::Cluster), ",,,");
    }
}
