//! Observability: structured logging, lifecycle events, audit trail
//!
//! ```ignore
//! use colshell::observability::{Event, Logger, ObservationScope, log_event_with_fields};
//!
//! Logger::info("COMMAND_DISPATCHED", &[("command", "list")]);
//! log_event_with_fields(Event::AclHandleReleased, &[("table", "system:acl")]);
//!
//! let scope = ObservationScope::new("GRANT");
//! // ... do work ...
//! scope.complete();
//! ```

mod events;
mod logger;
mod scope;
pub mod audit;

pub use audit::{
    AuditAction, AuditLog, AuditOutcome, AuditRecord, FileAuditLog, MemoryAuditLog, NullAuditLog,
};
pub use events::Event;
pub use logger::{Logger, Severity};
pub use scope::ObservationScope;

fn severity_of(event: Event) -> Severity {
    if event.is_warning() {
        Severity::Warn
    } else {
        Severity::Info
    }
}

/// Log a lifecycle event.
pub fn log_event(event: Event) {
    Logger::log(severity_of(event), event.as_str(), &[]);
}

/// Log a lifecycle event with fields.
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity_of(event), event.as_str(), fields);
}
