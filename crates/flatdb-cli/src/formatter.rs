//! Output formatting for command results.
//!
//! Supports table, JSON, CSV, and raw output formats.

use std::fmt;
use std::str::FromStr;

use comfy_table::{Cell, ContentArrangement, Table};
use serde_json::{json, Value as JsonValue};
use thiserror::Error;

use flatdb_common::ID_COLUMN;
use flatdb_store::{Record, TableSchema};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Formatted table output.
    Table,
    /// JSON output.
    Json,
    /// CSV output.
    Csv,
    /// Raw output (values separated by tabs).
    Raw,
}

impl OutputFormat {
    /// Returns the format name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Raw => "raw",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An output format name that is not recognized.
#[derive(Debug, Error)]
#[error("unknown format '{0}' (available: table, json, csv, raw)")]
pub struct UnknownFormat(String);

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "raw" => Ok(OutputFormat::Raw),
            _ => Err(UnknownFormat(s.trim().to_string())),
        }
    }
}

/// Column headers and string cells of a result set.
struct Grid {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Grid {
    fn from_records(schema: &TableSchema, records: &[Record]) -> Self {
        let columns: Vec<String> = std::iter::once(ID_COLUMN)
            .chain(schema.column_names())
            .map(str::to_string)
            .collect();
        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|col| record.rendered(col).unwrap_or_default())
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }
}

/// Formats records of a table.
pub fn format_records(schema: &TableSchema, records: &[Record], format: OutputFormat) -> String {
    match format {
        OutputFormat::Table if records.is_empty() => "No data.".to_string(),
        OutputFormat::Table => {
            let grid = Grid::from_records(schema, records);
            format!("{}\n{}", format_table(&grid), row_summary(records.len()))
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string())
        }
        OutputFormat::Csv => format_csv(&Grid::from_records(schema, records)),
        OutputFormat::Raw => format_raw(&Grid::from_records(schema, records)),
    }
}

/// Formats the list of table names.
pub fn format_table_list(names: &[&str], format: OutputFormat) -> String {
    match format {
        OutputFormat::Table if names.is_empty() => "No tables.".to_string(),
        OutputFormat::Table => {
            let mut out = String::from("Tables:");
            for name in names {
                out.push_str("\n - ");
                out.push_str(name);
            }
            out
        }
        OutputFormat::Json => json!(names).to_string(),
        OutputFormat::Csv | OutputFormat::Raw => names.join("\n"),
    }
}

/// Formats a table's schema and row count.
pub fn format_schema(name: &str, schema: &TableSchema, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            let mut out = format!("Table: {name}\nColumns:\n  - {ID_COLUMN}: int");
            for (column, ty) in schema.columns() {
                out.push_str(&format!("\n  - {column}: {ty}"));
            }
            out.push_str(&format!("\nRecords: {}", schema.row_count()));
            out
        }
        OutputFormat::Json => {
            let columns: serde_json::Map<String, JsonValue> = schema
                .columns()
                .iter()
                .map(|(column, ty)| (column.clone(), json!(ty.as_str())))
                .collect();
            let info = json!({
                "table": name,
                "columns": columns,
                "rows": schema.row_count(),
            });
            serde_json::to_string_pretty(&info).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Csv | OutputFormat::Raw => {
            let sep = if format == OutputFormat::Csv { "," } else { "\t" };
            let mut out = format!("column{sep}type\n{ID_COLUMN}{sep}int");
            for (column, ty) in schema.columns() {
                out.push_str(&format!("\n{column}{sep}{ty}"));
            }
            out
        }
    }
}

fn row_summary(count: usize) -> String {
    format!("({} row{})", count, if count == 1 { "" } else { "s" })
}

/// Formats the grid as a table.
fn format_table(grid: &Grid) -> String {
    let mut table = Table::new();

    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);

    table.set_header(grid.columns.iter().map(Cell::new));
    for row in &grid.rows {
        table.add_row(row.iter().map(Cell::new));
    }

    table.to_string()
}

/// Formats the grid as CSV.
fn format_csv(grid: &Grid) -> String {
    let mut output = String::new();

    let header: Vec<String> = grid.columns.iter().map(|c| escape_csv(c)).collect();
    output.push_str(&header.join(","));

    for row in &grid.rows {
        let values: Vec<String> = row.iter().map(|v| escape_csv(v)).collect();
        output.push('\n');
        output.push_str(&values.join(","));
    }

    output
}

/// Escapes a value for CSV output.
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Formats the grid as raw tab-separated values.
fn format_raw(grid: &Grid) -> String {
    let mut output = grid.columns.join("\t");
    for row in &grid.rows {
        output.push('\n');
        output.push_str(&row.join("\t"));
    }
    output
}
