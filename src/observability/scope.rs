//! Begin/complete logging around one unit of work

use std::cell::Cell;

use super::logger::Logger;

/// Logs `<NAME>_BEGIN` on creation and exactly one closing event:
/// - `<NAME>_COMPLETE` from `complete`
/// - `<NAME>_REJECTED` from `reject`, for failures the operator caused
/// - `<NAME>_FAILED` from `fail`
/// - `<NAME>_INCOMPLETE` when dropped without any of the above
///
/// ```ignore
/// let scope = ObservationScope::with_fields("GRANT", &[("user", "bob")]);
/// // ... do work ...
/// scope.complete();
/// ```
pub struct ObservationScope {
    name: &'static str,
    closed: Cell<bool>,
    fields: Vec<(&'static str, String)>,
}

impl ObservationScope {
    pub fn new(name: &'static str) -> Self {
        Self::with_fields(name, &[])
    }

    pub fn with_fields(name: &'static str, fields: &[(&'static str, &str)]) -> Self {
        Logger::trace(&format!("{}_BEGIN", name), fields);
        Self {
            name,
            closed: Cell::new(false),
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
        }
    }

    fn field_refs(&self) -> Vec<(&str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect()
    }

    pub fn complete(self) {
        self.complete_with_fields(&[]);
    }

    pub fn complete_with_fields(self, extra: &[(&str, &str)]) {
        self.closed.set(true);
        let mut fields = self.field_refs();
        fields.extend(extra.iter().copied());
        Logger::info(&format!("{}_COMPLETE", self.name), &fields);
    }

    pub fn reject(self, reason: &str) {
        self.closed.set(true);
        let mut fields = self.field_refs();
        fields.push(("reason", reason));
        Logger::info(&format!("{}_REJECTED", self.name), &fields);
    }

    pub fn fail(self, reason: &str) {
        self.closed.set(true);
        let mut fields = self.field_refs();
        fields.push(("reason", reason));
        Logger::warn(&format!("{}_FAILED", self.name), &fields);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.closed.get() {
            let mut fields = self.field_refs();
            fields.push(("reason", "scope dropped without completion"));
            Logger::warn(&format!("{}_INCOMPLETE", self.name), &fields);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_open_until_closed() {
        let scope = ObservationScope::new("TEST");
        assert!(!scope.is_closed());
        scope.complete();
    }

    #[test]
    fn test_scope_with_fields_and_extra() {
        let scope = ObservationScope::with_fields("TEST", &[("table", "t1")]);
        scope.complete_with_fields(&[("rows", "3")]);
    }

    #[test]
    fn test_scope_reject_and_fail() {
        ObservationScope::new("TEST").reject("bad arguments");
        ObservationScope::new("TEST").fail("remote failure");
    }

    #[test]
    fn test_scope_drop_without_close() {
        drop(ObservationScope::new("TEST"));
    }
}
