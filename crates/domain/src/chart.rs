//! Chart tables: column-oriented reshaping of report lists for charting clients.
//!
//! The shape follows the Google Charts `DataTable` literal:
//! `{"cols": [{"label", "type"}], "rows": [{"c": [{"v"}]}]}`.

use serde::Serialize;
use serde_json::Value;

/// Value type of a chart column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Date,
    Number,
}

/// Column descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub label: &'static str,
    #[serde(rename = "type")]
    pub kind: ColumnType,
}

impl Column {
    #[must_use]
    pub fn date(label: &'static str) -> Self {
        Self {
            label,
            kind: ColumnType::Date,
        }
    }

    #[must_use]
    pub fn number(label: &'static str) -> Self {
        Self {
            label,
            kind: ColumnType::Number,
        }
    }
}

/// One value of a row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub v: Value,
}

impl Cell {
    #[must_use]
    pub fn new(value: impl Into<Value>) -> Self {
        Self { v: value.into() }
    }
}

/// One record of the table, cells in column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub c: Vec<Cell>,
}

/// A record type that knows its chart columns.
pub trait Chartable {
    /// Column descriptors, in display order.
    fn columns() -> Vec<Column>;

    /// Cells of one record, in the same order as [`Chartable::columns`].
    fn cells(&self) -> Vec<Cell>;
}

/// Column headers followed by one row per record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartTable {
    pub cols: Vec<Column>,
    pub rows: Vec<Row>,
}

impl ChartTable {
    /// Reshape `records` keeping their order.
    #[must_use]
    pub fn from_records<T: Chartable>(records: &[T]) -> Self {
        Self {
            cols: T::columns(),
            rows: records.iter().map(|r| Row { c: r.cells() }).collect(),
        }
    }
}
