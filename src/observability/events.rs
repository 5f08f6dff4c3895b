//! Typed lifecycle events

use std::fmt;

/// Observable lifecycle points of a shell session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Session
    ConfigLoaded,
    ConnectionOpened,
    /// A connection attempt failed and may be retried
    ConnectionAttemptFailed,
    ClusterStateSaved,

    // Commands
    CommandDispatched,
    ScriptLineFailed,
    /// An audit record could not be written
    AuditAppendFailed,

    // Data commands
    /// Closing a table handle failed after the operation returned
    TableHandleCloseFailed,

    // Access control
    AclHandleOpened,
    AclHandleReleased,
    /// Closing the ACL table handle itself failed
    AclHandleCloseFailed,

    // Bulk operations
    BulkConfirmationRequested,
    BulkAborted,
    BulkEntityFailed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ConnectionOpened => "CONNECTION_OPENED",
            Event::ConnectionAttemptFailed => "CONNECTION_ATTEMPT_FAILED",
            Event::ClusterStateSaved => "CLUSTER_STATE_SAVED",
            Event::CommandDispatched => "COMMAND_DISPATCHED",
            Event::ScriptLineFailed => "SCRIPT_LINE_FAILED",
            Event::AuditAppendFailed => "AUDIT_APPEND_FAILED",
            Event::TableHandleCloseFailed => "TABLE_HANDLE_CLOSE_FAILED",
            Event::AclHandleOpened => "ACL_HANDLE_OPENED",
            Event::AclHandleReleased => "ACL_HANDLE_RELEASED",
            Event::AclHandleCloseFailed => "ACL_HANDLE_CLOSE_FAILED",
            Event::BulkConfirmationRequested => "BULK_CONFIRMATION_REQUESTED",
            Event::BulkAborted => "BULK_ABORTED",
            Event::BulkEntityFailed => "BULK_ENTITY_FAILED",
        }
    }

    /// Events that signal something the operator should look at.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Event::ConnectionAttemptFailed
                | Event::AuditAppendFailed
                | Event::TableHandleCloseFailed
                | Event::AclHandleCloseFailed
                | Event::BulkEntityFailed
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_upper_snake() {
        let events = [
            Event::ConfigLoaded,
            Event::ConnectionOpened,
            Event::ConnectionAttemptFailed,
            Event::ClusterStateSaved,
            Event::CommandDispatched,
            Event::ScriptLineFailed,
            Event::AuditAppendFailed,
            Event::TableHandleCloseFailed,
            Event::AclHandleOpened,
            Event::AclHandleReleased,
            Event::AclHandleCloseFailed,
            Event::BulkConfirmationRequested,
            Event::BulkAborted,
            Event::BulkEntityFailed,
        ];
        for event in events {
            assert!(event.as_str().chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_warning_events() {
        assert!(Event::BulkEntityFailed.is_warning());
        assert!(Event::AuditAppendFailed.is_warning());
        assert!(Event::TableHandleCloseFailed.is_warning());
        assert!(!Event::AclHandleReleased.is_warning());
        assert_eq!(Event::AclHandleReleased.to_string(), "ACL_HANDLE_RELEASED");
    }
}
