//! Grant, revoke and list permissions

use std::sync::Arc;

use super::action::ActionSet;
use super::grant::{PermissionGrant, PermissionMap};
use super::scope::{PermissionScope, PermissionTarget};
use crate::cluster::{AccessControlService, AdminResult, Connection, TableHandle};
use crate::observability::{log_event_with_fields, Event, ObservationScope};
use crate::shell::{EntityKind, ErrorClassification, ShellError, ShellResult};

/// Permission operations against the ACL system table.
///
/// Checks run in a fixed order before the endpoint is contacted: security
/// availability, target existence, then the arguments. A failed check
/// issues no RPC.
pub struct PermissionManager {
    connection: Arc<dyn Connection>,
    acl_table: String,
}

impl PermissionManager {
    pub fn new(connection: Arc<dyn Connection>, acl_table: impl Into<String>) -> Self {
        Self {
            connection,
            acl_table: acl_table.into(),
        }
    }

    pub fn acl_table(&self) -> &str {
        &self.acl_table
    }

    /// Grant `actions` to `principal` at the scope `target` resolves to.
    ///
    /// Security availability and the target are checked before the action
    /// set, so an empty set on a cluster without an ACL table reports
    /// `SecurityUnavailable`.
    pub fn grant(
        &self,
        principal: &str,
        actions: ActionSet,
        target: &PermissionTarget,
    ) -> ShellResult<()> {
        let scope = self.resolve_scope(target)?;
        self.grant_at(principal, actions, scope)
    }

    /// Like [`grant`](Self::grant), with the actions still in their
    /// operator-supplied form (`RW`). Unknown codes are reported only once
    /// the target has resolved.
    pub fn grant_codes(
        &self,
        principal: &str,
        codes: &str,
        target: &PermissionTarget,
    ) -> ShellResult<()> {
        let scope = self.resolve_scope(target)?;
        let actions = ActionSet::parse(codes)?;
        self.grant_at(principal, actions, scope)
    }

    fn grant_at(
        &self,
        principal: &str,
        actions: ActionSet,
        scope: PermissionScope,
    ) -> ShellResult<()> {
        check_principal(principal)?;
        if actions.is_empty() {
            return Err(ShellError::validation(
                "No permissions given; specify one or more of R, W, X, C, A",
            ));
        }

        let codes = actions.codes();
        let observation = ObservationScope::with_fields(
            "GRANT",
            &[
                ("principal", principal),
                ("scope", scope.to_string().as_str()),
                ("actions", codes.as_str()),
            ],
        );
        let result =
            self.with_acl_service(|acl| acl.grant(principal, &scope, &actions.encode()));
        close_observation(observation, &result);
        result
    }

    /// Revoke every action `principal` holds at the scope `target` resolves to.
    ///
    /// Revoking a principal that holds nothing is accepted.
    pub fn revoke(&self, principal: &str, target: &PermissionTarget) -> ShellResult<()> {
        let scope = self.resolve_scope(target)?;
        check_principal(principal)?;

        let observation = ObservationScope::with_fields(
            "REVOKE",
            &[("principal", principal), ("scope", scope.to_string().as_str())],
        );
        let result = self.with_acl_service(|acl| {
            acl.revoke(principal, &scope, &ActionSet::empty().encode())
        });
        close_observation(observation, &result);
        result
    }

    /// Permissions at `target`, keyed by principal then `family:qualifier`.
    pub fn list_permissions(&self, target: &PermissionTarget) -> ShellResult<PermissionMap> {
        let mut map = PermissionMap::new();
        self.for_each_permission(target, |grant| {
            let actions = map
                .entry(grant.principal.clone())
                .or_default()
                .entry(grant.scope.column_key())
                .or_default();
            *actions = actions.union(&grant.actions);
        })?;
        Ok(map)
    }

    /// Deliver each permission at `target` to `callback`; returns how many
    /// were delivered.
    pub fn for_each_permission<F>(&self, target: &PermissionTarget, mut callback: F) -> ShellResult<usize>
    where
        F: FnMut(&PermissionGrant),
    {
        let scope = self.resolve_scope(target)?;
        let observation =
            ObservationScope::with_fields("LIST_PERMISSIONS", &[("scope", scope.to_string().as_str())]);

        let result = self.with_acl_service(|acl| {
            let rows = acl.get_user_permissions(&scope)?;
            let mut count = 0;
            for row in &rows {
                callback(&row.decode()?);
                count += 1;
            }
            Ok(count)
        });
        match &result {
            Ok(count) => observation.complete_with_fields(&[("count", count.to_string().as_str())]),
            Err(err) => observation.fail(&err.to_string()),
        }
        result
    }

    /// Validate `target` against the cluster and turn it into a scope.
    pub fn resolve_scope(&self, target: &PermissionTarget) -> ShellResult<PermissionScope> {
        let admin = self.connection.admin();
        if !admin.table_exists(&self.acl_table)? {
            return Err(ErrorClassification::SecurityUnavailable.into());
        }

        let name = match target.target.as_deref() {
            None | Some("") => {
                if target.family.is_some() {
                    return Err(ShellError::validation(
                        "A column family requires a table target",
                    ));
                }
                return Ok(PermissionScope::Cluster);
            }
            Some(name) => name,
        };

        if let Some(namespace) = target.namespace_name() {
            if namespace.is_empty() {
                return Err(ShellError::validation("Namespace name must not be empty"));
            }
            if target.family.is_some() || target.qualifier.is_some() {
                return Err(ShellError::validation(format!(
                    "Namespace target @{} takes no column family or qualifier",
                    namespace
                )));
            }
            if !admin.namespace_exists(namespace)? {
                return Err(ShellError::not_found(EntityKind::Namespace, namespace));
            }
            return Ok(PermissionScope::Namespace {
                namespace: namespace.to_string(),
            });
        }

        if !admin.table_exists(name)? {
            return Err(ShellError::not_found(EntityKind::Table, name));
        }
        let family = match target.family.as_deref() {
            None => {
                return Ok(PermissionScope::Table {
                    table: name.to_string(),
                })
            }
            Some(family) => family,
        };

        let descriptor = admin.describe_table(name)?;
        if !descriptor.has_family(family) {
            return Err(ErrorClassification::ColumnFamilyNotFound {
                family: family.to_string(),
                valid_families: descriptor.family_names(),
            }
            .into());
        }

        Ok(match target.qualifier.as_deref() {
            Some(qualifier) => PermissionScope::Qualifier {
                table: name.to_string(),
                family: family.to_string(),
                qualifier: qualifier.to_string(),
            },
            None => PermissionScope::Family {
                table: name.to_string(),
                family: family.to_string(),
            },
        })
    }

    /// Run `f` against the access-control endpoint; the ACL table handle is
    /// closed whatever `f` returns.
    fn with_acl_service<T, F>(&self, f: F) -> ShellResult<T>
    where
        F: FnOnce(&dyn AccessControlService) -> AdminResult<T>,
    {
        let handle = AclHandle::open(self.connection.as_ref(), &self.acl_table)?;
        let service = handle.service()?;
        Ok(f(service.as_ref())?)
    }
}

fn check_principal(principal: &str) -> ShellResult<()> {
    if principal.trim().is_empty() {
        return Err(ShellError::validation("User name must not be empty"));
    }
    Ok(())
}

fn close_observation(observation: ObservationScope, result: &ShellResult<()>) {
    match result {
        Ok(()) => observation.complete(),
        Err(err) => observation.fail(&err.to_string()),
    }
}

/// Open handle on the ACL table, closed on drop.
struct AclHandle {
    handle: Box<dyn TableHandle>,
}

impl AclHandle {
    fn open(connection: &dyn Connection, table: &str) -> AdminResult<Self> {
        let handle = connection.open_table(table)?;
        log_event_with_fields(Event::AclHandleOpened, &[("table", table)]);
        Ok(Self { handle })
    }

    fn service(&self) -> AdminResult<Arc<dyn AccessControlService>> {
        self.handle.access_control_service()
    }
}

impl Drop for AclHandle {
    fn drop(&mut self) {
        let table = self.handle.name().to_string();
        match self.handle.close() {
            Ok(()) => log_event_with_fields(Event::AclHandleReleased, &[("table", table.as_str())]),
            Err(err) => log_event_with_fields(
                Event::AclHandleCloseFailed,
                &[("table", table.as_str()), ("reason", err.message())],
            ),
        }
    }
}
