//! Pipeline execution engine.
//!
//! Runs Sanitize → Format → Filter over a table and reports what happened.
//! Every stage builds a new table; the input is never modified.

use super::filter::filter_table;
use super::format::format_table;
use super::sanitize::sanitize_table;
use super::spec::PipelineConfig;
use super::validation::validate_config;
use crate::error::{Result, SheetError};
use crate::model::ColumnDescriptor;
use crate::table::Table;
use std::time::{Duration, Instant};

/// Report generated after pipeline execution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Number of rows before processing
    pub rows_before: usize,

    /// Number of rows admitted by the filters
    pub rows_after: usize,

    /// Cells changed by the sanitize stage
    pub cells_sanitized: usize,

    /// Cells changed by the format stage
    pub cells_formatted: usize,

    /// Number of stages that did any work
    pub stages_applied: usize,

    /// Warnings generated during execution
    pub warnings: Vec<String>,

    /// Time taken for execution
    pub duration: Duration,
}

impl RunReport {
    /// Create a summary message
    pub fn summary(&self) -> String {
        format!(
            "Pipeline completed: rows {} ({} → {}), {} cells sanitized, {} cells formatted, {} stages, {:.2}s",
            if self.rows_after < self.rows_before {
                "filtered"
            } else {
                "unchanged"
            },
            self.rows_before,
            self.rows_after,
            self.cells_sanitized,
            self.cells_formatted,
            self.stages_applied,
            self.duration.as_secs_f64()
        )
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub table: Table,
    pub report: RunReport,
}

/// Execute a pipeline config on a table.
///
/// # Errors
///
/// Returns `Config` when validation finds a fatal problem. Unknown column
/// references are reported as warnings instead.
pub fn run_pipeline(
    table: &Table,
    descriptors: &[ColumnDescriptor],
    config: &PipelineConfig,
) -> Result<PipelineOutput> {
    let start = Instant::now();

    let (fatal, warnings): (Vec<_>, Vec<_>) = validate_config(config, table.columns())
        .into_iter()
        .partition(|e| e.fatal);

    if !fatal.is_empty() {
        return Err(SheetError::Config(format!(
            "Pipeline validation failed:\n{}",
            fatal
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n")
        )));
    }

    let mut report = RunReport {
        rows_before: table.len(),
        warnings: warnings.iter().map(ToString::to_string).collect(),
        ..Default::default()
    };
    for warning in &report.warnings {
        tracing::warn!("{warning}");
    }

    let (sanitized, cells_sanitized) = sanitize_table(table, descriptors, &config.sanitization);
    report.cells_sanitized = cells_sanitized;
    if cells_sanitized > 0 {
        report.stages_applied += 1;
    }

    let (formatted, cells_formatted) = format_table(&sanitized, &config.formatters);
    report.cells_formatted = cells_formatted;
    if cells_formatted > 0 {
        report.stages_applied += 1;
    }

    let filtered = filter_table(&formatted, &config.filters);
    if !config.filters.is_empty() {
        report.stages_applied += 1;
    }

    report.rows_after = filtered.len();
    report.duration = start.elapsed();
    tracing::info!("{}", report.summary());

    Ok(PipelineOutput {
        table: filtered,
        report,
    })
}
