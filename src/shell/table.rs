//! Reusable handle bound to one table

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use super::errors::{EntityKind, ShellError, ShellResult};
use crate::cluster::{AdminResult, Cell, Column, Connection, ScanSpec, TableHandle};
use crate::observability::{log_event_with_fields, Event};

/// A table the operator can run data commands against.
///
/// Each call opens a cluster handle and closes it before returning, so a
/// `TableRef` can be kept across commands.
#[derive(Clone)]
pub struct TableRef {
    name: String,
    connection: Arc<dyn Connection>,
}

impl fmt::Debug for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableRef").field("name", &self.name).finish()
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Table[{}]", self.name)
    }
}

impl TableRef {
    /// Bind to an existing table.
    pub fn open(connection: Arc<dyn Connection>, name: &str) -> ShellResult<Self> {
        if !connection.admin().table_exists(name)? {
            return Err(ShellError::not_found(EntityKind::Table, name));
        }
        Ok(Self {
            name: name.to_string(),
            connection,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, row: &str, columns: &[Column]) -> ShellResult<Vec<Cell>> {
        self.with_handle(|t| t.get(row, columns))
    }

    pub fn put(
        &self,
        row: &str,
        column: &Column,
        value: &[u8],
        timestamp: Option<i64>,
    ) -> ShellResult<()> {
        let qualifier = column.qualifier.as_deref().unwrap_or("");
        self.with_handle(|t| t.put(row, &column.family, qualifier, value, timestamp))
    }

    /// Delete one column (or a whole family) of a row.
    pub fn delete(&self, row: &str, column: &Column) -> ShellResult<()> {
        self.with_handle(|t| t.delete(row, Some(column)))
    }

    /// Delete every cell of a row.
    pub fn delete_all(&self, row: &str) -> ShellResult<()> {
        self.with_handle(|t| t.delete(row, None))
    }

    pub fn scan(&self, spec: &ScanSpec) -> ShellResult<Vec<Cell>> {
        self.with_handle(|t| t.scan(spec))
    }

    /// Number of rows in the table.
    pub fn count(&self) -> ShellResult<usize> {
        let cells = self.scan(&ScanSpec::default())?;
        Ok(cells.iter().map(|c| c.row.as_str()).collect::<BTreeSet<_>>().len())
    }

    /// Add `amount` to a counter cell; returns the new value.
    pub fn incr(&self, row: &str, column: &Column, amount: i64) -> ShellResult<i64> {
        let qualifier = column.qualifier.as_deref().unwrap_or("");
        self.with_handle(|t| t.increment(row, &column.family, qualifier, amount))
    }

    /// Current value of a counter cell, `None` when the cell is absent.
    pub fn get_counter(&self, row: &str, column: &Column) -> ShellResult<Option<i64>> {
        let cells = self.get(row, std::slice::from_ref(column))?;
        let qualifier = column.qualifier.as_deref().unwrap_or("");
        let cell = match cells.into_iter().find(|c| c.qualifier == qualifier) {
            Some(cell) => cell,
            None => return Ok(None),
        };
        let bytes: [u8; 8] = cell.value.as_slice().try_into().map_err(|_| {
            ShellError::validation(format!(
                "Cell {} of row {} is {} bytes wide, a counter is 8",
                cell.column(),
                row,
                cell.value.len()
            ))
        })?;
        Ok(Some(i64::from_be_bytes(bytes)))
    }

    fn with_handle<T, F>(&self, f: F) -> ShellResult<T>
    where
        F: FnOnce(&dyn TableHandle) -> AdminResult<T>,
    {
        let handle = OpenTable(self.connection.open_table(&self.name)?);
        Ok(f(handle.0.as_ref())?)
    }
}

/// Closes the wrapped handle on drop.
struct OpenTable(Box<dyn TableHandle>);

impl Drop for OpenTable {
    fn drop(&mut self) {
        if let Err(err) = self.0.close() {
            let table = self.0.name().to_string();
            log_event_with_fields(
                Event::TableHandleCloseFailed,
                &[("table", table.as_str()), ("reason", err.message())],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{Admin, AdminError, FamilyDescriptor, LocalCluster, TableDescriptor};
    use crate::shell::ErrorClassification;

    fn table() -> (LocalCluster, TableRef) {
        let cluster = LocalCluster::new();
        cluster
            .create_table(&TableDescriptor::new("t1").with_family(FamilyDescriptor::new("cf")))
            .unwrap();
        let table = TableRef::open(Arc::new(cluster.clone()), "t1").unwrap();
        (cluster, table)
    }

    fn column(spec: &str) -> Column {
        Column::parse(spec).unwrap()
    }

    #[test]
    fn test_open_missing_table() {
        let cluster = LocalCluster::new();
        let err = TableRef::open(Arc::new(cluster), "nope").unwrap_err();
        assert_eq!(
            err.classification(),
            Some(&ErrorClassification::not_found(EntityKind::Table, "nope"))
        );
    }

    #[test]
    fn test_put_get_count_and_delete() {
        let (cluster, table) = table();
        table.put("r1", &column("cf:a"), b"1", None).unwrap();
        table.put("r1", &column("cf:b"), b"2", None).unwrap();
        table.put("r2", &column("cf:a"), b"3", None).unwrap();
        assert_eq!(table.count().unwrap(), 2);

        table.delete("r1", &column("cf:a")).unwrap();
        assert_eq!(table.get("r1", &[]).unwrap().len(), 1);

        table.delete_all("r1").unwrap();
        assert_eq!(table.count().unwrap(), 1);
        assert_eq!(cluster.open_handles(), 0);
    }

    #[test]
    fn test_close_failure_does_not_mask_result() {
        let (cluster, table) = table();
        cluster.inject_failure("close_table", AdminError::other("connection reset"));

        table.put("r1", &column("cf:a"), b"1", None).unwrap();
        assert_eq!(cluster.call_count("close_table"), 1);
        assert_eq!(cluster.open_handles(), 0);
        assert_eq!(table.get("r1", &[]).unwrap().len(), 1);
    }

    #[test]
    fn test_counter() {
        let (_cluster, table) = table();
        let c = column("cf:hits");
        assert_eq!(table.get_counter("r", &c).unwrap(), None);
        table.incr("r", &c, 5).unwrap();
        assert_eq!(table.incr("r", &c, 2).unwrap(), 7);
        assert_eq!(table.get_counter("r", &c).unwrap(), Some(7));
    }

    #[test]
    fn test_counter_rejects_non_counter_cell() {
        let (_cluster, table) = table();
        let c = column("cf:name");
        table.put("r", &c, b"bob", None).unwrap();
        let err = table.get_counter("r", &c).unwrap_err();
        assert!(matches!(
            err.classification(),
            Some(ErrorClassification::Validation(_))
        ));
    }
}
