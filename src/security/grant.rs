//! Permission grants and the raw rows returned by the endpoint

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::action::ActionSet;
use super::scope::PermissionScope;
use crate::cluster::{AdminError, AdminResult};

/// Actions held by a principal at one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub principal: String,
    pub scope: PermissionScope,
    pub actions: ActionSet,
}

/// A permission row as the access-control endpoint returns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRow {
    pub principal: String,
    pub scope: PermissionScope,
    /// Encoded action codes.
    pub actions: Vec<u8>,
}

impl PermissionRow {
    pub fn decode(&self) -> AdminResult<PermissionGrant> {
        let actions = ActionSet::from_bytes(&self.actions).map_err(|b| {
            AdminError::other(format!(
                "Permission row for '{}' carries unknown action code 0x{:02x}",
                self.principal, b
            ))
        })?;
        Ok(PermissionGrant {
            principal: self.principal.clone(),
            scope: self.scope.clone(),
            actions,
        })
    }
}

/// principal → (`family:qualifier` → actions)
pub type PermissionMap = BTreeMap<String, BTreeMap<String, ActionSet>>;
