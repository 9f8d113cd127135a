//! Excel/ODS workbooks via `calamine`.

use super::normalize_rows;
use crate::error::{Result, ResultExt as _, SheetError};
use crate::model::{CellValue, Grid};
use calamine::{Data, DataType as _, Reader as _, open_workbook_auto_from_rs};
use std::io::Cursor;

/// Reads one sheet (the first, or `sheet` by name) into a grid.
///
/// # Errors
///
/// `Load` for unreadable containers or an unknown sheet name,
/// `EmptySource` for a workbook without sheets.
pub fn read_workbook(bytes: &[u8], sheet: Option<&str>) -> Result<Grid> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .context("Failed to open workbook")?;

    let names = workbook.sheet_names();
    let name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| {
                SheetError::Load(format!(
                    "Sheet '{wanted}' not found (available: {})",
                    names.join(", ")
                ))
            })?,
        None => names
            .first()
            .cloned()
            .ok_or_else(|| SheetError::EmptySource("workbook has no sheets".to_owned()))?,
    };

    let range = workbook
        .worksheet_range(&name)
        .with_context(|| format!("Failed to read sheet '{name}'"))?;

    tracing::debug!("Reading sheet '{name}' ({} rows)", range.height());

    Ok(normalize_rows(
        range.rows().map(|row| row.iter().map(convert_cell).collect()),
    ))
}

/// Maps a calamine cell onto the primitive cell model.
pub fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.trim().is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Int(i) => CellValue::from(*i),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(CellValue::Date)
            .or_else(|| cell.as_f64().map(CellValue::Number))
            .unwrap_or_default(),
        // ISO date/duration strings pass through as text; error cells are blank.
        other => other.as_string().map(CellValue::String).unwrap_or_default(),
    }
}
