//! Permission scopes and operator target addressing

use std::fmt;

use serde::{Deserialize, Serialize};

/// Leading character that marks a target string as a namespace.
pub const NAMESPACE_SIGIL: char = '@';

/// Where a permission applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum PermissionScope {
    Cluster,
    Namespace {
        namespace: String,
    },
    Table {
        table: String,
    },
    Family {
        table: String,
        family: String,
    },
    Qualifier {
        table: String,
        family: String,
        qualifier: String,
    },
}

impl PermissionScope {
    pub fn namespace(&self) -> Option<&str> {
        match self {
            PermissionScope::Namespace { namespace } => Some(namespace),
            _ => None,
        }
    }

    pub fn table(&self) -> Option<&str> {
        match self {
            PermissionScope::Table { table }
            | PermissionScope::Family { table, .. }
            | PermissionScope::Qualifier { table, .. } => Some(table),
            _ => None,
        }
    }

    pub fn family(&self) -> Option<&str> {
        match self {
            PermissionScope::Family { family, .. } | PermissionScope::Qualifier { family, .. } => {
                Some(family)
            }
            _ => None,
        }
    }

    pub fn qualifier(&self) -> Option<&str> {
        match self {
            PermissionScope::Qualifier { qualifier, .. } => Some(qualifier),
            _ => None,
        }
    }

    /// `family:qualifier` key, with empty parts where the scope has none.
    pub fn column_key(&self) -> String {
        format!(
            "{}:{}",
            self.family().unwrap_or(""),
            self.qualifier().unwrap_or("")
        )
    }

    /// Whether a permission recorded at `other` is listed when querying
    /// `self`. Table-level queries include the table's family and
    /// qualifier scopes.
    pub fn includes(&self, other: &PermissionScope) -> bool {
        match (self, other) {
            (PermissionScope::Cluster, PermissionScope::Cluster) => true,
            (PermissionScope::Namespace { namespace: a }, PermissionScope::Namespace { namespace: b }) => {
                a == b
            }
            (PermissionScope::Table { table }, _) => other.table() == Some(table.as_str()),
            (PermissionScope::Family { table, family }, _) => {
                other.table() == Some(table.as_str()) && other.family() == Some(family.as_str())
            }
            (PermissionScope::Qualifier { .. }, _) => self == other,
            _ => false,
        }
    }
}

impl fmt::Display for PermissionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionScope::Cluster => write!(f, "cluster"),
            PermissionScope::Namespace { namespace } => write!(f, "{}{}", NAMESPACE_SIGIL, namespace),
            PermissionScope::Table { table } => write!(f, "{}", table),
            PermissionScope::Family { table, family } => write!(f, "{}/{}", table, family),
            PermissionScope::Qualifier {
                table,
                family,
                qualifier,
            } => write!(f, "{}/{}:{}", table, family, qualifier),
        }
    }
}

/// Unresolved target as the operator typed it: `[<table>|@<ns> [<family> [<qualifier>]]]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionTarget {
    pub target: Option<String>,
    pub family: Option<String>,
    pub qualifier: Option<String>,
}

impl PermissionTarget {
    /// Cluster-wide target.
    pub fn cluster() -> Self {
        Self::default()
    }

    pub fn table(name: impl Into<String>) -> Self {
        Self {
            target: Some(name.into()),
            ..Self::default()
        }
    }

    /// Namespace target; the sigil is added.
    pub fn namespace(name: &str) -> Self {
        Self {
            target: Some(format!("{}{}", NAMESPACE_SIGIL, name)),
            ..Self::default()
        }
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// Build from up to three positional arguments.
    pub fn from_args(args: &[String]) -> Self {
        Self {
            target: args.first().cloned(),
            family: args.get(1).cloned(),
            qualifier: args.get(2).cloned(),
        }
    }

    /// Namespace name when the target carries the sigil.
    pub fn namespace_name(&self) -> Option<&str> {
        self.target
            .as_deref()
            .and_then(|t| t.strip_prefix(NAMESPACE_SIGIL))
    }
}
