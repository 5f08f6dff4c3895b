//! Command registry
//!
//! The set of commands is closed: every command is a [`CommandKind`]
//! variant with one entry in [`COMMANDS`]. The registry is built once and
//! never mutated.

use std::fmt;

/// Registry section a command is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommandGroup {
    General,
    Ddl,
    Namespace,
    Dml,
    Tools,
    Snapshots,
    Replication,
    Security,
}

impl CommandGroup {
    pub const ALL: [CommandGroup; 8] = [
        CommandGroup::General,
        CommandGroup::Ddl,
        CommandGroup::Namespace,
        CommandGroup::Dml,
        CommandGroup::Tools,
        CommandGroup::Snapshots,
        CommandGroup::Replication,
        CommandGroup::Security,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandGroup::General => "general",
            CommandGroup::Ddl => "ddl",
            CommandGroup::Namespace => "namespace",
            CommandGroup::Dml => "dml",
            CommandGroup::Tools => "tools",
            CommandGroup::Snapshots => "snapshots",
            CommandGroup::Replication => "replication",
            CommandGroup::Security => "security",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.as_str() == name)
    }
}

impl fmt::Display for CommandGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    // general
    Status,
    Version,
    Whoami,

    // ddl
    Create,
    Alter,
    Describe,
    Exists,
    List,
    Enable,
    Disable,
    IsEnabled,
    IsDisabled,
    Drop,
    Truncate,
    GetTable,
    EnableAll,
    DisableAll,
    DropAll,

    // namespace
    CreateNamespace,
    DropNamespace,
    ListNamespace,
    ListNamespaceTables,

    // dml
    Get,
    Put,
    Delete,
    DeleteAll,
    Scan,
    Count,
    Incr,
    GetCounter,

    // tools
    Move,
    Assign,
    Unassign,
    BalanceSwitch,
    ListRegions,

    // snapshots
    Snapshot,
    ListSnapshots,
    DeleteSnapshot,

    // replication
    AddPeer,
    RemovePeer,
    ListPeers,
    EnablePeer,
    DisablePeer,
    GetPeerState,
    ListReplicatedTables,
    SetPeerTableCfs,
    ShowPeerTableCfs,

    // security
    Grant,
    Revoke,
    UserPermission,
}

/// A registered command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub name: &'static str,
    pub group: CommandGroup,
    pub kind: CommandKind,
    /// Fewest positional arguments accepted.
    pub min_args: usize,
    /// Most positional arguments accepted; `None` for no limit.
    pub max_args: Option<usize>,
    pub usage: &'static str,
    pub help: &'static str,
}

impl Command {
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.map_or(true, |max| count <= max)
    }

    /// Usage line followed by the description.
    pub fn help_text(&self) -> String {
        format!("Usage: {}\n\n{}", self.usage, self.help)
    }
}

const fn command(
    name: &'static str,
    group: CommandGroup,
    kind: CommandKind,
    min_args: usize,
    max_args: Option<usize>,
    usage: &'static str,
    help: &'static str,
) -> Command {
    Command {
        name,
        group,
        kind,
        min_args,
        max_args,
        usage,
        help,
    }
}

use CommandGroup as G;
use CommandKind as K;

/// Every command the shell knows.
pub const COMMANDS: &[Command] = &[
    command("status", G::General, K::Status, 0, Some(0), "status",
        "Show live and dead servers, region count and average load."),
    command("version", G::General, K::Version, 0, Some(0), "version",
        "Show the shell version."),
    command("whoami", G::General, K::Whoami, 0, Some(0), "whoami",
        "Show the operator name this session runs as."),

    command("create", G::Ddl, K::Create, 2, None, "create <table> <family> [<family> ...]",
        "Create a table with one or more column families.\n\n  create 't1', 'f1', 'f2'"),
    command("alter", G::Ddl, K::Alter, 2, Some(3), "alter <table> <family> | alter <table> delete <family>",
        "Add a column family to a table, or delete one.\n\n  alter 't1', 'f3'\n  alter 't1', 'delete', 'f1'"),
    command("describe", G::Ddl, K::Describe, 1, Some(1), "describe <table>",
        "Show the column families of a table."),
    command("exists", G::Ddl, K::Exists, 1, Some(1), "exists <table>",
        "Report whether the named table exists."),
    command("list", G::Ddl, K::List, 0, Some(1), "list [<regex>]",
        "List tables, optionally only those whose whole name matches the expression.\n\n  list\n  list 'ab.*'"),
    command("enable", G::Ddl, K::Enable, 1, Some(1), "enable <table>",
        "Enable the named table."),
    command("disable", G::Ddl, K::Disable, 1, Some(1), "disable <table>",
        "Disable the named table."),
    command("is_enabled", G::Ddl, K::IsEnabled, 1, Some(1), "is_enabled <table>",
        "Report whether the named table is enabled."),
    command("is_disabled", G::Ddl, K::IsDisabled, 1, Some(1), "is_disabled <table>",
        "Report whether the named table is disabled."),
    command("drop", G::Ddl, K::Drop, 1, Some(1), "drop <table>",
        "Drop the named table. The table must be disabled first."),
    command("truncate", G::Ddl, K::Truncate, 1, Some(1), "truncate <table>",
        "Disable, drop and recreate the named table with the same column families."),
    command("get_table", G::Ddl, K::GetTable, 1, Some(1), "get_table <table>",
        "Return a reference to the table for running data commands against it."),
    command("enable_all", G::Ddl, K::EnableAll, 1, Some(1), "enable_all <regex>",
        "Enable every table whose name matches the expression, after confirmation."),
    command("disable_all", G::Ddl, K::DisableAll, 1, Some(1), "disable_all <regex>",
        "Disable every table whose name matches the expression, after confirmation."),
    command("drop_all", G::Ddl, K::DropAll, 1, Some(1), "drop_all <regex>",
        "Drop every table whose name matches the expression, after confirmation.\nMatching tables must be disabled."),

    command("create_namespace", G::Namespace, K::CreateNamespace, 1, Some(1), "create_namespace <namespace>",
        "Create a namespace."),
    command("drop_namespace", G::Namespace, K::DropNamespace, 1, Some(1), "drop_namespace <namespace>",
        "Drop a namespace. The namespace must be empty."),
    command("list_namespace", G::Namespace, K::ListNamespace, 0, Some(1), "list_namespace [<regex>]",
        "List namespaces."),
    command("list_namespace_tables", G::Namespace, K::ListNamespaceTables, 1, Some(1), "list_namespace_tables <namespace>",
        "List the tables of a namespace."),

    command("get", G::Dml, K::Get, 2, None, "get <table> <row> [<family[:qualifier]> ...]",
        "Get a row, optionally restricted to some columns.\n\n  get 't1', 'r1'\n  get 't1', 'r1', 'c1:a'"),
    command("put", G::Dml, K::Put, 4, Some(5), "put <table> <row> <family:qualifier> <value> [<timestamp>]",
        "Put a cell value. Non-printable bytes may be written as \\xNN."),
    command("delete", G::Dml, K::Delete, 3, Some(3), "delete <table> <row> <family[:qualifier]>",
        "Delete a cell, or every cell of a family, in a row."),
    command("deleteall", G::Dml, K::DeleteAll, 2, Some(2), "deleteall <table> <row>",
        "Delete every cell of a row."),
    command("scan", G::Dml, K::Scan, 1, Some(2), "scan <table> [<limit>]",
        "Scan a table, optionally returning at most <limit> rows."),
    command("count", G::Dml, K::Count, 1, Some(1), "count <table>",
        "Count the rows of a table."),
    command("incr", G::Dml, K::Incr, 3, Some(4), "incr <table> <row> <family:qualifier> [<amount>]",
        "Increment a counter cell by <amount> (default 1)."),
    command("get_counter", G::Dml, K::GetCounter, 3, Some(3), "get_counter <table> <row> <family:qualifier>",
        "Show the value of a counter cell."),

    command("move", G::Tools, K::Move, 1, Some(2), "move <encoded_region> [<server>]",
        "Move a region to the given server, or to one of the cluster's choosing."),
    command("assign", G::Tools, K::Assign, 1, Some(1), "assign <encoded_region>",
        "Assign a region."),
    command("unassign", G::Tools, K::Unassign, 1, Some(2), "unassign <encoded_region> [true|false]",
        "Unassign a region. Pass true to force."),
    command("balance_switch", G::Tools, K::BalanceSwitch, 1, Some(1), "balance_switch <true|false>",
        "Turn the balancer on or off; prints the previous setting."),
    command("list_regions", G::Tools, K::ListRegions, 1, Some(1), "list_regions <table>",
        "List the regions of a table and their servers."),

    command("snapshot", G::Snapshots, K::Snapshot, 2, Some(2), "snapshot <table> <snapshot>",
        "Take a snapshot of a table."),
    command("list_snapshots", G::Snapshots, K::ListSnapshots, 0, Some(1), "list_snapshots [<regex>]",
        "List snapshots."),
    command("delete_snapshot", G::Snapshots, K::DeleteSnapshot, 1, Some(1), "delete_snapshot <snapshot>",
        "Delete a snapshot."),

    command("add_peer", G::Replication, K::AddPeer, 2, Some(3), "add_peer <id> <quorum:port:/path> [<table-cfs>]",
        "Add a replication peer.\n\n  add_peer '1', 'zk1,zk2:2181:/hbase'\n  add_peer '2', 'zk:2181:/hbase', 't1; t2:cf1,cf2'"),
    command("remove_peer", G::Replication, K::RemovePeer, 1, Some(1), "remove_peer <id>",
        "Stop replicating to a peer and remove it."),
    command("list_peers", G::Replication, K::ListPeers, 0, Some(0), "list_peers",
        "List replication peers with their cluster keys and states."),
    command("enable_peer", G::Replication, K::EnablePeer, 1, Some(1), "enable_peer <id>",
        "Resume shipping edits to a peer."),
    command("disable_peer", G::Replication, K::DisablePeer, 1, Some(1), "disable_peer <id>",
        "Stop shipping edits to a peer; edits are kept until it is enabled."),
    command("get_peer_state", G::Replication, K::GetPeerState, 1, Some(1), "get_peer_state <id>",
        "Show whether a peer is enabled."),
    command("list_replicated_tables", G::Replication, K::ListReplicatedTables, 0, Some(1), "list_replicated_tables [<regex>]",
        "List replicated column families, optionally for tables matching the expression."),
    command("set_peer_tableCFs", G::Replication, K::SetPeerTableCfs, 1, Some(2), "set_peer_tableCFs <id> [<table-cfs>]",
        "Set the tables and families replicated to a peer; omit to replicate everything."),
    command("show_peer_tableCFs", G::Replication, K::ShowPeerTableCfs, 1, Some(1), "show_peer_tableCFs <id>",
        "Show the tables and families replicated to a peer."),

    command("grant", G::Security, K::Grant, 2, Some(5), "grant <user> <permissions> [<table>|@<namespace> [<family> [<qualifier>]]]",
        "Grant permissions. Permissions are zero or more letters from RWXCA:\nREAD('R'), WRITE('W'), EXEC('X'), CREATE('C'), ADMIN('A').\n\n  grant 'bob', 'RW', 't1', 'f1', 'col1'\n  grant 'bob', 'C', '@ns1'"),
    command("revoke", G::Security, K::Revoke, 1, Some(4), "revoke <user> [<table>|@<namespace> [<family> [<qualifier>]]]",
        "Revoke every permission a user holds at the given scope.\n\n  revoke 'bob', 't1', 'f1', 'col1'"),
    command("user_permission", G::Security, K::UserPermission, 0, Some(1), "user_permission [<table>|@<namespace>]",
        "Show permissions at cluster scope, or for a table or namespace."),
];

/// Name-indexed, read-only view of [`COMMANDS`].
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    commands: &'static [Command],
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl CommandRegistry {
    pub fn standard() -> Self {
        Self { commands: COMMANDS }
    }

    pub fn lookup(&self, name: &str) -> Option<&'static Command> {
        self.commands.iter().find(|c| c.name == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.commands.iter().map(|c| c.name).collect()
    }

    pub fn in_group(&self, group: CommandGroup) -> Vec<&'static Command> {
        self.commands.iter().filter(|c| c.group == group).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_unique() {
        let registry = CommandRegistry::standard();
        let names: HashSet<_> = registry.names().into_iter().collect();
        assert_eq!(names.len(), registry.len());
    }

    #[test]
    fn test_every_group_populated() {
        let registry = CommandRegistry::standard();
        for group in CommandGroup::ALL {
            assert!(!registry.in_group(group).is_empty(), "{} is empty", group);
        }
    }

    #[test]
    fn test_lookup_and_arity() {
        let registry = CommandRegistry::standard();
        let grant = registry.lookup("grant").unwrap();
        assert_eq!(grant.kind, CommandKind::Grant);
        assert!(!grant.accepts(1));
        assert!(grant.accepts(2));
        assert!(grant.accepts(5));
        assert!(!grant.accepts(6));
        assert!(registry.lookup("nope").is_none());
    }

    #[test]
    fn test_group_parse() {
        assert_eq!(CommandGroup::parse("dml"), Some(CommandGroup::Dml));
        assert_eq!(CommandGroup::parse("other"), None);
    }

    #[test]
    fn test_help_text_starts_with_usage() {
        let drop = CommandRegistry::standard().lookup("drop").unwrap();
        assert!(drop.help_text().starts_with("Usage: drop <table>"));
    }
}
