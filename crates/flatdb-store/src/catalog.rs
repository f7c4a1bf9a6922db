//! Table catalog for metadata management.
//!
//! The catalog maps every table name to its [`TableSchema`]: ordered column
//! definitions, the number of stored rows and the highest ID ever handed out.
//! Schema changes touch both the catalog and a table's row storage; each is
//! applied to a copy first and only committed in memory once both durable
//! writes succeeded.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use flatdb_common::{FlatError, FlatResult, ID_COLUMN};

use crate::ordered;
use crate::persist::Persistence;
use crate::value::ColumnType;

/// Shape and bookkeeping of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Column name -> declared type, in declaration order.
    #[serde(with = "ordered")]
    columns: Vec<(String, ColumnType)>,
    /// Number of records in the table's row storage.
    #[serde(rename = "rows")]
    row_count: u64,
    /// Highest ID ever assigned. IDs are never reused.
    #[serde(default)]
    last_id: u64,
}

impl TableSchema {
    /// Creates an empty table schema.
    pub fn new(columns: Vec<(String, ColumnType)>) -> Self {
        Self {
            columns,
            row_count: 0,
            last_id: 0,
        }
    }

    /// Returns the column definitions in order.
    pub fn columns(&self) -> &[(String, ColumnType)] {
        &self.columns
    }

    /// Returns the column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Returns the declared type of a column.
    pub fn column_type(&self, column: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, ty)| *ty)
    }

    /// Returns the number of stored rows.
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Returns the highest ID ever assigned.
    pub fn last_id(&self) -> u64 {
        self.last_id
    }

    pub(crate) fn set_row_count(&mut self, count: u64) {
        self.row_count = count;
    }

    pub(crate) fn set_last_id(&mut self, id: u64) {
        self.last_id = self.last_id.max(id);
    }
}

/// Registry of all tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Tables in definition order.
    #[serde(with = "ordered", default)]
    tables: Vec<(String, TableSchema)>,
}

impl Catalog {
    /// Creates a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if no table is defined.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Checks if a table exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Lists all table names in definition order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Gets a table schema.
    pub fn get(&self, name: &str) -> Option<&TableSchema> {
        self.tables
            .iter()
            .find(|(table, _)| table == name)
            .map(|(_, schema)| schema)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut TableSchema> {
        self.tables
            .iter_mut()
            .find(|(table, _)| table == name)
            .map(|(_, schema)| schema)
    }

    /// Describes a table.
    pub fn describe_table(&self, name: &str) -> FlatResult<&TableSchema> {
        self.get(name)
            .ok_or_else(|| FlatError::table_not_found(name))
    }

    /// Defines a new table with empty row storage.
    ///
    /// Fails with `TableExists` if the name is taken and with a validation
    /// error if the name or columns are unusable. On any failure the catalog
    /// is left unchanged.
    pub fn define_table(
        &mut self,
        store: &dyn Persistence,
        name: &str,
        columns: Vec<(String, ColumnType)>,
    ) -> FlatResult<()> {
        validate_identifier("table", name)?;
        validate_columns(&columns)?;

        if self.contains(name) {
            return Err(FlatError::table_exists(name));
        }

        let mut next = self.clone();
        next.tables
            .push((name.to_string(), TableSchema::new(columns)));

        store.save_rows(name, &[])?;
        if let Err(e) = store.save_catalog(&next) {
            if let Err(cleanup) = store.delete_table_storage(name) {
                warn!(table = name, error = %cleanup, "failed to remove storage of undefined table");
            }
            return Err(e);
        }

        *self = next;
        info!(table = name, "table created");
        Ok(())
    }

    /// Removes a table and its row storage.
    ///
    /// Fails with `TableNotFound` if the table is not defined. Missing row
    /// storage is not an error: the catalog entry is dropped anyway so the
    /// catalog never lists a table without storage.
    ///
    /// The catalog is saved before the rows are deleted. If the delete then
    /// fails the previous catalog is saved again, so on any failure both the
    /// rows and the catalog are left as they were.
    pub fn remove_table(&mut self, store: &dyn Persistence, name: &str) -> FlatResult<()> {
        if !self.contains(name) {
            return Err(FlatError::table_not_found(name));
        }

        let mut next = self.clone();
        next.tables.retain(|(table, _)| table != name);
        store.save_catalog(&next)?;

        match store.delete_table_storage(name) {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                warn!(table = name, "row storage already missing, dropping catalog entry");
            }
            Err(e) => {
                if let Err(restore) = store.save_catalog(self) {
                    warn!(table = name, error = %restore, "failed to restore catalog after drop failure");
                }
                return Err(e);
            }
        }

        *self = next;
        info!(table = name, "table dropped");
        Ok(())
    }

    /// Records a table's new row count and persists the catalog.
    pub fn record_row_count(
        &mut self,
        store: &dyn Persistence,
        name: &str,
        count: u64,
    ) -> FlatResult<()> {
        self.commit_table_change(store, name, |schema| schema.set_row_count(count))
    }

    /// Applies `change` to a table's schema, persists the catalog and only
    /// then commits the change in memory.
    pub(crate) fn commit_table_change<F>(
        &mut self,
        store: &dyn Persistence,
        name: &str,
        change: F,
    ) -> FlatResult<()>
    where
        F: FnOnce(&mut TableSchema),
    {
        let mut next = self.clone();
        let schema = next
            .get_mut(name)
            .ok_or_else(|| FlatError::table_not_found(name))?;
        change(schema);

        store.save_catalog(&next)?;
        *self = next;
        Ok(())
    }
}

/// Table and column names end up in file names and command lines, so only
/// ASCII letters, digits and underscores are accepted.
fn validate_identifier(kind: &str, name: &str) -> FlatResult<()> {
    if name.is_empty() {
        return Err(FlatError::validation(format!("{kind} name must not be empty")));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(FlatError::validation(format!(
            "invalid {kind} name '{name}': only letters, digits and '_' are allowed"
        )));
    }
    Ok(())
}

fn validate_columns(columns: &[(String, ColumnType)]) -> FlatResult<()> {
    if columns.is_empty() {
        return Err(FlatError::validation("a table needs at least one column"));
    }

    for (i, (name, _)) in columns.iter().enumerate() {
        validate_identifier("column", name)?;
        if name == ID_COLUMN {
            return Err(FlatError::validation(format!(
                "column name '{ID_COLUMN}' is reserved"
            )));
        }
        if columns[..i].iter().any(|(other, _)| other == name) {
            return Err(FlatError::validation(format!("duplicate column '{name}'")));
        }
    }
    Ok(())
}
