//! CSV and other delimited text.

use super::{coerce_text, normalize_rows};
use crate::error::{Result, ResultExt as _};
use crate::model::Grid;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reads delimited text without treating any row as a header.
///
/// Records may have different lengths; the materializer pads them later.
///
/// # Errors
///
/// Returns `Load` when a record cannot be decoded.
pub fn read_delimited(bytes: &[u8], delimiter: u8) -> Result<Grid> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read record {}", idx + 1))?;
        rows.push(record.iter().map(coerce_text).collect());
    }

    Ok(normalize_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;

    #[test]
    fn test_ragged_and_quoted_records() {
        let data = "\u{feff}name,note\n\"Smith, J\",\"said \"\"hi\"\"\"\nsolo\n";
        let grid = read_delimited(data.as_bytes(), b',').expect("read");
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[0][0], CellValue::text("name"));
        assert_eq!(grid[1][0], CellValue::text("Smith, J"));
        assert_eq!(grid[1][1], CellValue::text("said \"hi\""));
        assert_eq!(grid[2].len(), 1);
    }

    #[test]
    fn test_tab_delimiter() {
        let grid = read_delimited(b"a\tb\n1\t2\n", b'\t').expect("read");
        assert_eq!(grid[1], vec![CellValue::Number(1.0), CellValue::Number(2.0)]);
    }
}
