//! Record-level operations on a single table.
//!
//! Every operation reads the table's whole row collection from storage;
//! every mutation writes the whole collection back and then brings the
//! catalog's bookkeeping in line with it. If the catalog cannot be saved the
//! previous rows are written back, so a failed mutation leaves neither the
//! rows nor the catalog changed.

use tracing::{debug, warn};

use flatdb_common::{FlatError, FlatResult, ID_COLUMN};

use crate::catalog::Catalog;
use crate::persist::Persistence;
use crate::predicate::Predicate;
use crate::record::Record;

/// Appends a new record built from raw text values, one per column.
///
/// The record gets the next unused ID: one past the highest ID the table
/// has ever held, so IDs of deleted records are never handed out again.
pub fn insert<S: AsRef<str>>(
    catalog: &mut Catalog,
    store: &dyn Persistence,
    table: &str,
    values: &[S],
) -> FlatResult<Record> {
    let schema = catalog.describe_table(table)?;
    let columns = schema.columns();
    if values.len() != columns.len() {
        return Err(FlatError::ColumnCountMismatch {
            table: table.to_string(),
            expected: columns.len(),
            actual: values.len(),
        });
    }

    let fields = columns
        .iter()
        .zip(values)
        .map(|((name, ty), raw)| Ok((name.clone(), ty.coerce(name, raw.as_ref())?)))
        .collect::<FlatResult<Vec<_>>>()?;
    let last_id = schema.last_id();

    let previous = store.load_rows(table)?;
    let highest = previous.iter().map(Record::id).max().unwrap_or(0);
    let id = last_id
        .max(highest)
        .checked_add(1)
        .ok_or_else(|| FlatError::validation(format!("ID space of table '{table}' is exhausted")))?;
    let record = Record::new(id, fields);

    let mut rows = previous.clone();
    rows.push(record.clone());
    store.save_rows(table, &rows)?;

    let count = rows.len() as u64;
    commit_or_restore(catalog, store, table, &previous, |schema| {
        schema.set_row_count(count);
        schema.set_last_id(id);
    })?;

    debug!(table, id, "record inserted");
    Ok(record)
}

/// Returns the table's records in storage order, optionally filtered.
pub fn scan(
    catalog: &Catalog,
    store: &dyn Persistence,
    table: &str,
    predicate: Option<&Predicate>,
) -> FlatResult<Vec<Record>> {
    catalog.describe_table(table)?;

    let mut rows = store.load_rows(table)?;
    if let Some(predicate) = predicate {
        rows.retain(|record| predicate.matches(record));
    }
    Ok(rows)
}

/// Sets `column` to `raw_value` on every record matching `predicate`.
///
/// The value is coerced to the column's declared type first. Returns the
/// number of records changed; the collection is rewritten even if that is
/// zero.
pub fn update_where(
    catalog: &mut Catalog,
    store: &dyn Persistence,
    table: &str,
    column: &str,
    raw_value: &str,
    predicate: &Predicate,
) -> FlatResult<usize> {
    let schema = catalog.describe_table(table)?;
    if column == ID_COLUMN {
        return Err(FlatError::validation(format!(
            "column '{ID_COLUMN}' cannot be updated"
        )));
    }
    let ty = schema
        .column_type(column)
        .ok_or_else(|| FlatError::ColumnNotFound {
            column: column.to_string(),
            table: table.to_string(),
        })?;
    let value = ty.coerce(column, raw_value)?;
    let recorded = schema.row_count();

    let previous = store.load_rows(table)?;
    let mut rows = previous.clone();
    let mut updated = 0;
    for record in rows.iter_mut().filter(|record| predicate.matches(record)) {
        record.set(column, value.clone());
        updated += 1;
    }
    store.save_rows(table, &rows)?;

    let count = rows.len() as u64;
    if count != recorded {
        commit_or_restore(catalog, store, table, &previous, |schema| {
            schema.set_row_count(count)
        })?;
    }

    debug!(table, column, updated, "records updated");
    Ok(updated)
}

/// Removes every record matching `predicate` and returns how many were
/// removed.
pub fn delete_where(
    catalog: &mut Catalog,
    store: &dyn Persistence,
    table: &str,
    predicate: &Predicate,
) -> FlatResult<usize> {
    catalog.describe_table(table)?;

    let previous = store.load_rows(table)?;
    let rows: Vec<Record> = previous
        .iter()
        .filter(|record| !predicate.matches(record))
        .cloned()
        .collect();
    let deleted = previous.len() - rows.len();
    store.save_rows(table, &rows)?;

    let count = rows.len() as u64;
    commit_or_restore(catalog, store, table, &previous, |schema| {
        schema.set_row_count(count)
    })?;

    debug!(table, deleted, "records deleted");
    Ok(deleted)
}

/// Commits a schema change, writing `previous` back if the catalog save
/// fails.
fn commit_or_restore<F>(
    catalog: &mut Catalog,
    store: &dyn Persistence,
    table: &str,
    previous: &[Record],
    change: F,
) -> FlatResult<()>
where
    F: FnOnce(&mut crate::catalog::TableSchema),
{
    catalog
        .commit_table_change(store, table, change)
        .map_err(|e| {
            if let Err(restore) = store.save_rows(table, previous) {
                warn!(table, error = %restore, "failed to restore rows after catalog error");
            }
            e
        })
}
