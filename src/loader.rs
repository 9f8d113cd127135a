//! Grid loading from workbooks, delimited text and extracted PDF text.
//!
//! Every source goes through [`normalize_rows`] so that row indices are the
//! same whether a caller asked for a preview or a full load. A header row
//! chosen on a preview therefore stays valid against the full grid.

pub mod delimited;
pub mod pdf;
pub mod workbook;

use crate::error::{Result, ResultExt as _, SheetError};
use crate::model::{CellValue, Grid, Row};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Source container kinds handled by [`load_grid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Workbook,
    Csv,
}

impl SourceKind {
    /// Picks a source kind from a file extension.
    ///
    /// # Errors
    ///
    /// Returns `Load` for extensions no loader understands.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Self::Workbook),
            "csv" | "txt" | "tsv" => Ok(Self::Csv),
            _ => Err(SheetError::Load(format!("Unsupported file extension: {ext}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Sheet to read; the first sheet when `None`
    pub sheet: Option<String>,
    pub delimiter: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            sheet: None,
            delimiter: b',',
        }
    }
}

/// Decodes `bytes` into a grid with no header assumption.
///
/// # Errors
///
/// `Load` when the container is unreadable, `EmptySource` when it has no
/// sheets or no non-blank rows.
pub fn load_grid(bytes: &[u8], kind: SourceKind, options: &LoadOptions) -> Result<Grid> {
    let grid = match kind {
        SourceKind::Workbook => workbook::read_workbook(bytes, options.sheet.as_deref())?,
        SourceKind::Csv => delimited::read_delimited(bytes, options.delimiter)?,
    };

    if grid.is_empty() {
        return Err(SheetError::EmptySource(
            "source contains no non-blank rows".to_owned(),
        ));
    }

    tracing::info!(
        "Loaded {:?} source: {} rows, widest row {} cells",
        kind,
        grid.len(),
        grid.iter().map(Vec::len).max().unwrap_or(0)
    );

    Ok(grid)
}

/// Reads a file from disk and decodes it according to its extension.
///
/// # Errors
///
/// See [`load_grid`]; I/O failures are reported as `Load`.
pub fn load_path(path: &Path, options: &LoadOptions) -> Result<Grid> {
    let kind = SourceKind::from_path(path)?;
    let mut options = options.clone();
    if options.delimiter == b','
        && path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("tsv"))
    {
        options.delimiter = b'\t';
    }

    let bytes = std::fs::read(path)
        .map_err(|e| SheetError::Load(format!("Failed to read {}: {e}", path.display())))?;
    load_grid(&bytes, kind, &options).with_context(|| format!("{}", path.display()))
}

/// First `limit` rows of an already-normalized grid.
pub fn preview(grid: &Grid, limit: usize) -> Grid {
    grid.iter().take(limit).cloned().collect()
}

/// Drops rows whose every cell is blank after trimming.
///
/// This runs before any row indexing, for previews and full loads alike.
pub fn normalize_rows(rows: impl IntoIterator<Item = Row>) -> Grid {
    rows.into_iter()
        .filter(|row| !row.iter().all(CellValue::is_empty))
        .collect()
}

// Leading zeros, and trailing zeros after the decimal point, keep a value
// textual so zip codes and amounts like "12.50" survive a CSV round trip.
static PLAIN_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?(0|[1-9]\d{0,14})(\.\d*[1-9])?$").expect("valid plain number regex")
});

/// Types a raw text field from a text-based source.
pub fn coerce_text(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CellValue::Empty;
    }

    if trimmed.eq_ignore_ascii_case("true") {
        return CellValue::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return CellValue::Bool(false);
    }

    if PLAIN_NUMBER_RE.is_match(trimmed)
        && let Ok(n) = trimmed.parse::<f64>()
    {
        return CellValue::Number(n);
    }

    CellValue::String(raw.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_drops_blank_rows() {
        let rows = vec![
            vec![CellValue::text("  "), CellValue::Empty],
            vec![CellValue::text("a")],
            vec![],
            vec![CellValue::Number(0.0)],
        ];
        let grid = normalize_rows(rows);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[0], vec![CellValue::text("a")]);
    }

    #[test]
    fn test_preview_matches_full_load_indices() {
        let bytes = b"Title,,\n,,\nName,Age,City\nAlice,30,Paris\n";
        let full = load_grid(bytes, SourceKind::Csv, &LoadOptions::default()).expect("load");
        let head = preview(&full, 2);
        assert_eq!(head.len(), 2);
        assert_eq!(head[1], full[1]);
        assert_eq!(full[1][0], CellValue::text("Name"));
    }

    #[test]
    fn test_coerce_text() {
        assert_eq!(coerce_text("42"), CellValue::Number(42.0));
        assert_eq!(coerce_text("-3.5"), CellValue::Number(-3.5));
        assert_eq!(coerce_text("02134"), CellValue::text("02134"));
        assert_eq!(coerce_text("1,000"), CellValue::text("1,000"));
        assert_eq!(coerce_text("12.50"), CellValue::text("12.50"));
        assert_eq!(coerce_text("7.0"), CellValue::text("7.0"));
        assert_eq!(coerce_text("12.05"), CellValue::Number(12.05));
        assert_eq!(coerce_text("TRUE"), CellValue::Bool(true));
        assert_eq!(coerce_text("   "), CellValue::Empty);
        assert_eq!(coerce_text("12345678901234567890"), CellValue::text("12345678901234567890"));
    }

    #[test]
    fn test_source_kind_from_path() {
        assert_eq!(
            SourceKind::from_path(Path::new("a/b.XLSX")).expect("kind"),
            SourceKind::Workbook
        );
        assert_eq!(
            SourceKind::from_path(Path::new("data.csv")).expect("kind"),
            SourceKind::Csv
        );
        assert!(matches!(
            SourceKind::from_path(Path::new("notes.docx")),
            Err(SheetError::Load(_))
        ));
    }

    #[test]
    fn test_blank_source_is_empty_error() {
        let result = load_grid(b" , \n,,\n", SourceKind::Csv, &LoadOptions::default());
        assert!(matches!(result, Err(SheetError::EmptySource(_))));
    }
}
