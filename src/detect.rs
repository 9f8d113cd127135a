//! Header row detection for human-authored spreadsheets.
//!
//! Titles, notes and blank banners often sit above the real header, so the
//! header is located with an ordered cascade where the first confident match
//! wins and ties always go to the earliest row:
//!
//! 1. a short, label-like row of strings;
//! 2. the start of a run of rows with a consistent column count;
//! 3. a string row followed by a more numeric row;
//! 4. the first reasonably dense row.

use crate::model::{CellValue, Grid};
use serde::Serialize;

/// Per-row structural statistics used by detection and diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowStats {
    pub index: usize,
    pub cell_count: usize,
    pub non_empty: usize,
    pub string_count: usize,
    pub number_count: usize,
    /// Share of non-empty cells that are strings, 0–100
    pub string_pct: f64,
    /// Mean character length of the row's string cells
    pub avg_string_len: f64,
}

impl RowStats {
    fn numeric_fraction(&self) -> f64 {
        if self.non_empty == 0 {
            0.0
        } else {
            self.number_count as f64 / self.non_empty as f64
        }
    }

    fn fill_ratio(&self) -> f64 {
        if self.cell_count == 0 {
            0.0
        } else {
            self.non_empty as f64 / self.cell_count as f64
        }
    }
}

/// Which stage of the cascade picked the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStrategy {
    LabelRow,
    ConsistentStructure,
    TypeTransition,
    FirstDenseRow,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub row: usize,
    pub strategy: DetectionStrategy,
}

/// Scan limits for the cascade.
#[derive(Debug, Clone, Copy)]
pub struct DetectOptions {
    pub header_scan_rows: usize,
    pub fallback_scan_rows: usize,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            header_scan_rows: 15,
            fallback_scan_rows: 10,
        }
    }
}

impl From<&crate::config::AppSettings> for DetectOptions {
    fn from(settings: &crate::config::AppSettings) -> Self {
        Self {
            header_scan_rows: settings.header_scan_rows,
            fallback_scan_rows: settings.fallback_scan_rows,
        }
    }
}

const MIN_HEADER_CELLS: usize = 3;

pub fn row_stats(index: usize, row: &[CellValue]) -> RowStats {
    let non_empty = row.iter().filter(|c| !c.is_empty()).count();
    let strings: Vec<&str> = row
        .iter()
        .filter(|c| c.is_string())
        .filter_map(CellValue::as_str)
        .map(str::trim)
        .collect();
    let number_count = row.iter().filter(|c| c.is_number()).count();

    let string_pct = if non_empty == 0 {
        0.0
    } else {
        strings.len() as f64 / non_empty as f64 * 100.0
    };
    let avg_string_len = if strings.is_empty() {
        0.0
    } else {
        strings.iter().map(|s| s.chars().count()).sum::<usize>() as f64 / strings.len() as f64
    };

    RowStats {
        index,
        cell_count: row.len(),
        non_empty,
        string_count: strings.len(),
        number_count,
        string_pct,
        avg_string_len,
    }
}

/// Statistics for the first `limit` rows of a grid.
pub fn analyze_rows(grid: &Grid, limit: usize) -> Vec<RowStats> {
    grid.iter()
        .take(limit)
        .enumerate()
        .map(|(idx, row)| row_stats(idx, row))
        .collect()
}

/// Index of the most likely header row, with default scan limits.
pub fn detect_header_row(grid: &Grid) -> usize {
    detect_header(grid, &DetectOptions::default()).row
}

/// Runs the detection cascade and reports which stage matched.
pub fn detect_header(grid: &Grid, options: &DetectOptions) -> Detection {
    let scan = options.header_scan_rows.max(options.fallback_scan_rows);
    let stats = analyze_rows(grid, scan);

    let found = find_label_row(&stats, options.header_scan_rows)
        .map(|row| (row, DetectionStrategy::LabelRow))
        .or_else(|| {
            find_consistent_structure(&stats, options.header_scan_rows)
                .map(|row| (row, DetectionStrategy::ConsistentStructure))
        })
        .or_else(|| {
            find_type_transition(&stats, options.fallback_scan_rows)
                .map(|row| (row, DetectionStrategy::TypeTransition))
        })
        .or_else(|| {
            find_first_dense_row(&stats, options.fallback_scan_rows)
                .map(|row| (row, DetectionStrategy::FirstDenseRow))
        });

    let (row, strategy) = found.unwrap_or((0, DetectionStrategy::Default));
    tracing::debug!("Detected header row {row} via {strategy:?}");
    Detection { row, strategy }
}

fn find_label_row(stats: &[RowStats], limit: usize) -> Option<usize> {
    let window = stats.get(..limit.min(stats.len()))?;

    for (pos, row) in window.iter().enumerate() {
        if row.non_empty < MIN_HEADER_CELLS {
            continue;
        }

        let label_like = row.string_count >= MIN_HEADER_CELLS
            && row.string_pct > 65.0
            && row.fill_ratio() > 0.5
            && row.avg_string_len > 0.0
            && row.avg_string_len < 30.0;

        if !label_like {
            continue;
        }

        // Numbers right below a label row are supporting evidence only.
        if let Some(next) = stats.get(pos + 1)
            && next.non_empty >= row.non_empty
            && next.number_count > 0
        {
            tracing::trace!("Header candidate {} confirmed by numeric row below", row.index);
        }

        return Some(row.index);
    }

    None
}

fn find_consistent_structure(stats: &[RowStats], limit: usize) -> Option<usize> {
    let window = stats.get(..limit.min(stats.len()))?;

    let start = window.windows(3).position(|w| match w {
        [a, b, c] => {
            a.non_empty >= MIN_HEADER_CELLS
                && a.non_empty == b.non_empty
                && b.non_empty == c.non_empty
        }
        _ => false,
    })?;

    let row = window.get(start)?;
    if row.string_pct > 60.0 {
        return Some(start);
    }

    if let Some(prev) = start.checked_sub(1).and_then(|p| window.get(p))
        && prev.string_pct > 50.0
        && prev.non_empty >= MIN_HEADER_CELLS
    {
        return Some(prev.index);
    }

    Some(start)
}

fn find_type_transition(stats: &[RowStats], limit: usize) -> Option<usize> {
    let window_len = limit.min(stats.len());

    (0..window_len).find(|&idx| {
        let Some(row) = stats.get(idx) else {
            return false;
        };
        if row.non_empty == 0 || row.string_pct < 70.0 {
            return false;
        }
        let current = row.numeric_fraction();
        stats
            .iter()
            .skip(idx + 1)
            .take(2)
            .any(|next| next.non_empty > 0 && next.numeric_fraction() > current)
    })
}

fn find_first_dense_row(stats: &[RowStats], limit: usize) -> Option<usize> {
    let window = stats.get(..limit.min(stats.len()))?;
    let dense = || window.iter().filter(|r| r.non_empty >= MIN_HEADER_CELLS);

    dense()
        .find(|r| r.string_pct > 50.0)
        .or_else(|| dense().next())
        .map(|r| r.index)
}
