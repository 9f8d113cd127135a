//! Serialization of the output table to CSV or a single-sheet workbook.
//!
//! Column selection and renaming happen here and nowhere earlier, so
//! sanitization and inference always see the full original key set.

use crate::error::{Result, ResultExt as _, SheetError};
use crate::model::CellValue;
use crate::table::Table;
use chrono::Timelike as _;
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Worksheet name used for workbook output.
pub const SHEET_NAME: &str = "Data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }

    /// Format implied by a destination path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("csv") => Some(Self::Csv),
            Some("xlsx") => Some(Self::Xlsx),
            _ => None,
        }
    }
}

/// Serializes `table` restricted to `selected_columns` (empty = every column,
/// in table order), with headers taken from `display_names` where present.
///
/// # Errors
///
/// Returns `Export` when a selected column is not in the table or the
/// writer fails.
pub fn export(
    table: &Table,
    selected_columns: &[String],
    display_names: &BTreeMap<String, String>,
    format: ExportFormat,
) -> Result<Vec<u8>> {
    let keys: Vec<String> = if selected_columns.is_empty() {
        table.columns().to_vec()
    } else {
        selected_columns.to_vec()
    };

    if let Some(missing) = keys.iter().find(|k| !table.has_column(k)) {
        return Err(SheetError::Export(format!(
            "Selected column '{missing}' is not in the table"
        )));
    }

    let selected = table.select_columns(&keys)?;
    let header: Vec<String> = keys
        .iter()
        .map(|k| {
            display_names
                .get(k)
                .filter(|name| !name.trim().is_empty())
                .unwrap_or(k)
                .clone()
        })
        .collect();

    let bytes = match format {
        ExportFormat::Csv => write_csv(&selected, &header)?,
        ExportFormat::Xlsx => write_xlsx(&selected, &header)?,
    };

    tracing::info!(
        "Exported {} rows x {} columns as {} ({} bytes)",
        selected.len(),
        header.len(),
        format.extension(),
        bytes.len()
    );
    Ok(bytes)
}

/// Writes an export blob to disk.
pub fn save_export(bytes: &[u8], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write export to {}", path.display()))
}

fn write_csv(table: &Table, header: &[String]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(header)
        .map_err(|e| SheetError::Export(e.to_string()))?;
    for row in table.rows() {
        writer
            .write_record(row.iter().map(CellValue::render))
            .map_err(|e| SheetError::Export(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| SheetError::Export(format!("Failed to flush CSV: {e}")))
}

fn write_xlsx(table: &Table, header: &[String]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, name) in header.iter().enumerate() {
        sheet.write_string_with_format(0, xlsx_col(col)?, name, &bold)?;
    }

    for (idx, row) in table.rows().iter().enumerate() {
        let r = u32::try_from(idx + 1)
            .map_err(|_| SheetError::Export("Too many rows for a worksheet".to_owned()))?;
        for (col, cell) in row.iter().enumerate() {
            let c = xlsx_col(col)?;
            match cell {
                CellValue::Empty => {}
                CellValue::String(s) => {
                    sheet.write_string(r, c, s)?;
                }
                CellValue::Number(n) if n.is_finite() => {
                    sheet.write_number(r, c, *n)?;
                }
                CellValue::Number(_) => {
                    sheet.write_string(r, c, cell.render())?;
                }
                CellValue::Bool(b) => {
                    sheet.write_boolean(r, c, *b)?;
                }
                CellValue::Date(d) => {
                    let format = if d.time().num_seconds_from_midnight() == 0 {
                        &date_format
                    } else {
                        &datetime_format
                    };
                    sheet.write_datetime_with_format(r, c, d, format)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn xlsx_col(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| SheetError::Export("Too many columns for a worksheet".to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{LoadOptions, SourceKind, load_grid};
    use crate::table::materialize;

    fn table() -> Table {
        Table::new(
            vec!["name".into(), "note".into(), "age".into()],
            vec![
                vec![CellValue::text("Ada"), CellValue::text("says \"hi\", twice"), CellValue::Number(36.0)],
                vec![CellValue::text("Alan"), CellValue::Empty, CellValue::Bool(true)],
            ],
        )
    }

    #[test]
    fn test_csv_quoting_and_terminator() {
        let bytes = export(&table(), &[], &BTreeMap::new(), ExportFormat::Csv).expect("export");
        let text = String::from_utf8(bytes).expect("utf8");
        assert_eq!(
            text,
            "name,note,age\nAda,\"says \"\"hi\"\", twice\",36\nAlan,,true\n"
        );
    }

    #[test]
    fn test_selection_and_rename() {
        let mut names = BTreeMap::new();
        names.insert("age".to_owned(), "Age (years)".to_owned());
        names.insert("name".to_owned(), "  ".to_owned());
        let selected = vec!["age".to_owned(), "name".to_owned()];

        let bytes = export(&table(), &selected, &names, ExportFormat::Csv).expect("export");
        let text = String::from_utf8(bytes).expect("utf8");
        assert_eq!(text, "Age (years),name\n36,Ada\ntrue,Alan\n");
    }

    #[test]
    fn test_unknown_column_is_export_error() {
        let selected = vec!["ghost".to_owned()];
        match export(&table(), &selected, &BTreeMap::new(), ExportFormat::Csv) {
            Err(SheetError::Export(msg)) => assert!(msg.contains("ghost")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_xlsx_roundtrip_through_loader() {
        let bytes = export(&table(), &[], &BTreeMap::new(), ExportFormat::Xlsx).expect("export");
        assert!(bytes.starts_with(b"PK"));

        let grid = load_grid(&bytes, SourceKind::Workbook, &LoadOptions::default()).expect("load");
        let loaded = materialize(&grid, 0).expect("materialize");
        assert_eq!(loaded.columns(), ["name", "note", "age"]);
        assert_eq!(loaded.value(0, "age"), Some(&CellValue::Number(36.0)));
        assert_eq!(loaded.value(1, "age"), Some(&CellValue::Bool(true)));
        assert_eq!(loaded.value(1, "note"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ExportFormat::from_path(Path::new("out.CSV")), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_path(Path::new("out.xlsx")), Some(ExportFormat::Xlsx));
        assert_eq!(ExportFormat::from_path(Path::new("out.pdf")), None);
    }
}
