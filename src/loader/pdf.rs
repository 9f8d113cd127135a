//! Heuristic table extraction from PDF page text.
//!
//! Page text decoding happens upstream; this module receives the text of each
//! page and recovers a grid by treating tabs or runs of two or more spaces as
//! column gaps. Lines whose cell count strays from the dominant count are
//! treated as prose and dropped, and page headers repeated on later pages are
//! removed.

use super::{coerce_text, normalize_rows};
use crate::error::{Result, SheetError};
use crate::model::{CellValue, Grid, Row};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static COLUMN_GAP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\t+| {2,}").expect("valid column gap regex"));

/// Splits one text line into trimmed, non-empty cells.
pub fn split_line(line: &str) -> Vec<String> {
    COLUMN_GAP_RE
        .split(line.trim())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Most frequent cell count; ties go to the wider layout.
fn dominant_width(lines: &[Vec<String>]) -> Option<usize> {
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for line in lines {
        *counts.entry(line.len()).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|(wa, ca), (wb, cb)| ca.cmp(cb).then(wa.cmp(wb)))
        .map(|(width, _)| width)
}

fn fit_to_width(mut cells: Vec<String>, width: usize) -> Row {
    if cells.len() > width && width > 0 {
        let overflow = cells.split_off(width - 1).join(" ");
        cells.push(overflow);
    }
    let mut row: Row = cells.iter().map(|c| coerce_text(c)).collect();
    row.resize(width, CellValue::Empty);
    row
}

/// Extracts a grid from the text of one or more PDF pages.
///
/// # Errors
///
/// Returns `EmptySource` when no line splits into at least two cells.
pub fn extract_table(pages: &[String]) -> Result<Grid> {
    let lines: Vec<Vec<String>> = pages
        .iter()
        .flat_map(|page| page.lines())
        .map(split_line)
        .filter(|cells| cells.len() >= 2)
        .collect();

    let width = dominant_width(&lines)
        .ok_or_else(|| SheetError::EmptySource("no tabular lines found in PDF text".to_owned()))?;

    let mut kept: Vec<Vec<String>> = Vec::new();
    let mut dropped = 0usize;
    for cells in lines {
        if cells.len().abs_diff(width) > 1 {
            dropped += 1;
            continue;
        }
        // Page headers repeat verbatim at the top of every page.
        if kept.first().is_some_and(|first| *first == cells) {
            dropped += 1;
            continue;
        }
        kept.push(cells);
    }

    tracing::debug!(
        "PDF table extraction: {} rows kept, {dropped} lines dropped, {width} columns",
        kept.len()
    );

    Ok(normalize_rows(
        kept.into_iter().map(|cells| fit_to_width(cells, width)),
    ))
}
