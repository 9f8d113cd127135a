//! Row-object table and the materializer that builds it from a grid.
//!
//! A [`Table`] stores one ordered key list shared by every row, so each row
//! exposes exactly the same key set by construction. Tables are never patched
//! in place by the pipeline; every stage builds a new one.

use crate::error::{Result, SheetError};
use crate::model::{CellValue, Grid, Row};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

/// Borrowed view of one row as a key → value mapping.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    columns: &'a [String],
    cells: &'a [CellValue],
}

impl<'a> RowRef<'a> {
    /// `None` when the key is not a column of the table.
    pub fn get(&self, key: &str) -> Option<&'a CellValue> {
        self.columns
            .iter()
            .position(|c| c == key)
            .and_then(|idx| self.cells.get(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a CellValue)> + use<'a> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.cells.iter())
    }

    pub fn cells(&self) -> &'a [CellValue] {
        self.cells
    }
}

impl Table {
    /// Builds a table, padding short rows with `Empty` and dropping cells
    /// beyond the key list.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == key)
    }

    pub fn has_column(&self, key: &str) -> bool {
        self.column_index(key).is_some()
    }

    pub fn row(&self, idx: usize) -> Option<RowRef<'_>> {
        self.rows.get(idx).map(|cells| RowRef {
            columns: &self.columns,
            cells,
        })
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = RowRef<'_>> {
        self.rows.iter().map(|cells| RowRef {
            columns: &self.columns,
            cells,
        })
    }

    pub fn value(&self, row: usize, key: &str) -> Option<&CellValue> {
        let idx = self.column_index(key)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// String renders of one column, in row order.
    pub fn column_values(&self, key: &str) -> Option<Vec<String>> {
        let idx = self.column_index(key)?;
        Some(
            self.rows
                .iter()
                .map(|r| r.get(idx).map(CellValue::render).unwrap_or_default())
                .collect(),
        )
    }

    /// New table with the same keys and the given rows.
    pub fn with_rows(&self, rows: Vec<Row>) -> Self {
        Self::new(self.columns.clone(), rows)
    }

    /// New table restricted to `keys`, in the order given.
    ///
    /// # Errors
    ///
    /// Returns `Other` when a key is not a column of this table.
    pub fn select_columns(&self, keys: &[String]) -> Result<Self> {
        let indices = keys
            .iter()
            .map(|k| {
                self.column_index(k)
                    .ok_or_else(|| SheetError::Other(format!("Unknown column '{k}'")))
            })
            .collect::<Result<Vec<_>>>()?;

        let rows = self
            .rows
            .iter()
            .map(|r| {
                indices
                    .iter()
                    .map(|&i| r.get(i).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(Self::new(keys.to_vec(), rows))
    }

    /// Grid with a header row first, as handed to the export codecs.
    pub fn to_grid(&self, header: Vec<String>) -> Grid {
        let mut grid = Vec::with_capacity(self.rows.len() + 1);
        grid.push(header.into_iter().map(CellValue::String).collect());
        grid.extend(self.rows.iter().cloned());
        grid
    }
}

/// Builds a table from `grid` using row `header_row` for the column keys.
///
/// Keys are the trimmed header renders; empty or repeated keys become
/// `Column{n}` (1-based position). Every row after the header becomes a data
/// row aligned by position.
///
/// # Errors
///
/// Returns `HeaderOutOfRange` when `header_row` is not a row of `grid`.
pub fn materialize(grid: &Grid, header_row: usize) -> Result<Table> {
    let header = grid.get(header_row).ok_or(SheetError::HeaderOutOfRange {
        index: header_row,
        rows: grid.len(),
    })?;

    let columns = column_keys(header);
    let rows = grid
        .iter()
        .skip(header_row + 1)
        .cloned()
        .collect::<Vec<_>>();

    tracing::debug!(
        "Materialized table from header row {header_row}: {} columns, {} rows",
        columns.len(),
        rows.len()
    );

    Ok(Table::new(columns, rows))
}

fn column_keys(header: &[CellValue]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keys = Vec::with_capacity(header.len());

    for (idx, cell) in header.iter().enumerate() {
        let candidate = cell.render().trim().to_owned();
        let key = if candidate.is_empty() || seen.contains(&candidate) {
            let base = format!("Column{}", idx + 1);
            let mut synthetic = base.clone();
            let mut n = 1;
            while seen.contains(&synthetic) {
                n += 1;
                synthetic = format!("{base}_{n}");
            }
            synthetic
        } else {
            candidate
        };
        seen.insert(key.clone());
        keys.push(key);
    }

    keys
}
