//! Peer identifiers, cluster keys and table filters

use std::fmt;
use std::str::FromStr;

use crate::cluster::TableCfs;
use crate::shell::{ShellError, ShellResult};

/// Whether a peer receives edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    Enabled,
    Disabled,
}

impl PeerState {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            PeerState::Enabled
        } else {
            PeerState::Disabled
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PeerState::Enabled => "ENABLED",
            PeerState::Disabled => "DISABLED",
        }
    }
}

impl fmt::Display for PeerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Peer ids are non-empty and never contain `-`.
pub fn validate_peer_id(id: &str) -> ShellResult<()> {
    if id.is_empty() {
        return Err(ShellError::validation("Peer id must not be empty"));
    }
    if id.contains('-') {
        return Err(ShellError::validation(format!(
            "Invalid peer id '{}': '-' is not allowed",
            id
        )));
    }
    Ok(())
}

/// Address of a peer cluster: `quorum[,quorum...]:port:/root-path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterKey {
    pub quorum: Vec<String>,
    pub port: u16,
    pub root_path: String,
}

impl FromStr for ClusterKey {
    type Err = ShellError;

    fn from_str(key: &str) -> ShellResult<Self> {
        let invalid = |why: &str| {
            ShellError::validation(format!(
                "Invalid cluster key '{}': {}; expected quorum:port:/path",
                key, why
            ))
        };

        let mut parts = key.splitn(3, ':');
        let (quorum, port, root_path) = match (parts.next(), parts.next(), parts.next()) {
            (Some(q), Some(p), Some(r)) => (q, p, r),
            _ => return Err(invalid("missing component")),
        };

        let quorum: Vec<String> = quorum.split(',').map(|h| h.trim().to_string()).collect();
        if quorum.iter().any(String::is_empty) {
            return Err(invalid("empty quorum host"));
        }
        let port = port.parse::<u16>().map_err(|_| invalid("port is not a number"))?;
        if !root_path.starts_with('/') {
            return Err(invalid("root path must start with '/'"));
        }

        Ok(Self {
            quorum,
            port,
            root_path: root_path.to_string(),
        })
    }
}

impl fmt::Display for ClusterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.quorum.join(","), self.port, self.root_path)
    }
}

/// Parse `table[:cf1,cf2]; table2...`. A table without families replicates
/// all of them.
pub fn parse_table_cfs(spec: &str) -> ShellResult<TableCfs> {
    let mut table_cfs = TableCfs::new();
    for entry in spec.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let mut parts = entry.split(':');
        let table = parts.next().unwrap_or("").trim();
        let families = parts.next();
        if table.is_empty() || parts.next().is_some() {
            return Err(ShellError::validation(format!(
                "Invalid table-CFs entry '{}'; expected table[:cf1,cf2]",
                entry
            )));
        }
        let families: Vec<String> = match families {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        };
        table_cfs.entry(table.to_string()).or_default().extend(families);
    }
    if table_cfs.is_empty() {
        return Err(ShellError::validation("Table-CFs must name at least one table"));
    }
    Ok(table_cfs)
}

/// Render in the form [`parse_table_cfs`] accepts.
pub fn format_table_cfs(table_cfs: &TableCfs) -> String {
    table_cfs
        .iter()
        .map(|(table, families)| {
            if families.is_empty() {
                table.clone()
            } else {
                format!("{}:{}", table, families.join(","))
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}
