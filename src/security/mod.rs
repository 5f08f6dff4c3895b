//! Access control: permission actions, scopes and the permission manager
//!
//! Permissions live in the ACL system table. The manager resolves an
//! operator target into a [`PermissionScope`], validates it against the
//! cluster, then talks to the access-control endpoint hosted on that table.

mod action;
mod grant;
mod manager;
mod scope;

pub use action::{Action, ActionSet};
pub use grant::{PermissionGrant, PermissionMap, PermissionRow};
pub use manager::PermissionManager;
pub use scope::{PermissionScope, PermissionTarget, NAMESPACE_SIGIL};

/// Name of the table hosting the access-control endpoint.
pub const DEFAULT_ACL_TABLE: &str = "system:acl";
