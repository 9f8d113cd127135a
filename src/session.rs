//! Single-document application state.
//!
//! A [`Session`] owns the loaded grid, the chosen header row, the table built
//! from it, per-column descriptors, the column selection with its undo/redo
//! history, and the pipeline configuration. Derived data is rebuilt rather
//! than patched: a new grid or header row produces a new table, and the
//! pipeline output is recomputed from scratch whenever its inputs change.
//!
//! # Loads and stale results
//!
//! Every load or header change takes a new generation. A decode that was
//! started under an older generation is ignored when it finishes, so a slow
//! first load can never replace the result of a later, faster one. A failed
//! load or header change leaves the previous table in place.
//!
//! ```no_run
//! use sheetwise::loader::LoadOptions;
//! use sheetwise::session::{Session, await_load, load_in_background};
//!
//! # async fn example() -> sheetwise::error::Result<()> {
//! let mut session = Session::default();
//! let ticket = session.begin_load();
//! let options = session.load_options(&LoadOptions::default());
//! let handle = load_in_background("contacts.xlsx".into(), options);
//! session.finish_load(ticket, await_load(handle).await)?;
//! let output = session.recompute()?;
//! println!("{}", output.report.summary());
//! # Ok(())
//! # }
//! ```

mod history;

pub use history::History;

use crate::config::AppSettings;
use crate::detect::{self, Detection, DetectOptions};
use crate::error::{Result, SheetError};
use crate::export::{self, ExportFormat};
use crate::inference::infer_columns;
use crate::loader::{self, LoadOptions, SourceKind};
use crate::model::{ColumnDescriptor, Grid, SemanticType};
use crate::pipeline::{
    FilterPredicate, FormatRule, PipelineConfig, PipelineOutput, SanitizationOptions, run_pipeline,
};
use crate::presets::PresetConfig;
use crate::table::{Table, materialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::task::JoinHandle;

/// Table readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableStatus {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    LoadFailed,
    Reloading,
    ReloadFailed,
}

/// Proof of which generation a load was started under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Everything the pipeline output depends on.
#[derive(Debug, Clone, PartialEq)]
struct RecomputeKey {
    grid_version: u64,
    header_row: usize,
    descriptors: Vec<ColumnDescriptor>,
    config: PipelineConfig,
}

#[derive(Debug, Default)]
pub struct Session {
    settings: AppSettings,
    status: TableStatus,
    generation: u64,
    grid: Option<Grid>,
    grid_version: u64,
    header_row: usize,
    detection: Option<Detection>,
    table: Option<Table>,
    descriptors: Vec<ColumnDescriptor>,
    selected_columns: Vec<String>,
    history: Option<History<Vec<String>>>,
    config: PipelineConfig,
    cache: Option<(RecomputeKey, PipelineOutput)>,
    pipeline_runs: usize,
    last_error: Option<String>,
}

impl Session {
    pub fn new(settings: AppSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn status(&self) -> TableStatus {
        self.status
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    pub fn header_row(&self) -> usize {
        self.header_row
    }

    /// How the current header row was chosen, when it was detected.
    pub fn detection(&self) -> Option<Detection> {
        self.detection
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn descriptors(&self) -> &[ColumnDescriptor] {
        &self.descriptors
    }

    pub fn descriptor(&self, key: &str) -> Option<&ColumnDescriptor> {
        self.descriptors.iter().find(|d| d.key == key)
    }

    pub fn selected_columns(&self) -> &[String] {
        &self.selected_columns
    }

    pub fn filters(&self) -> &[FilterPredicate] {
        &self.config.filters
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Number of times the pipeline actually ran (cache misses).
    pub fn pipeline_runs(&self) -> usize {
        self.pipeline_runs
    }

    pub fn can_undo(&self) -> bool {
        self.history.as_ref().is_some_and(History::can_undo)
    }

    pub fn can_redo(&self) -> bool {
        self.history.as_ref().is_some_and(History::can_redo)
    }

    /// Starts a new load generation. Results for older tickets are ignored.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.status = TableStatus::Loading;
        LoadTicket(self.generation)
    }

    /// Installs the result of a load started with `ticket`.
    ///
    /// Returns `Ok(false)` when the ticket is stale and the result was
    /// dropped.
    ///
    /// # Errors
    ///
    /// The load's own error, after the session is marked `LoadFailed`. The
    /// previous table, if any, stays current.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<Grid>) -> Result<bool> {
        if ticket.0 != self.generation {
            tracing::debug!(
                "Ignoring stale load (generation {}, current {})",
                ticket.0,
                self.generation
            );
            return Ok(false);
        }

        let grid = match result {
            Ok(grid) => grid,
            Err(e) => return Err(self.fail(TableStatus::LoadFailed, e)),
        };

        let detection = detect::detect_header(&grid, &DetectOptions::from(&self.settings));
        let table = match materialize(&grid, detection.row) {
            Ok(table) => table,
            Err(e) => return Err(self.fail(TableStatus::LoadFailed, e)),
        };

        self.grid = Some(grid);
        self.grid_version += 1;
        self.header_row = detection.row;
        self.detection = Some(detection);
        self.install_table(table);
        Ok(true)
    }

    /// `options` with the configured default sheet filled in when none is
    /// named.
    pub fn load_options(&self, options: &LoadOptions) -> LoadOptions {
        let mut options = options.clone();
        if options.sheet.is_none() {
            options.sheet.clone_from(&self.settings.default_sheet);
        }
        options
    }

    /// Loads from bytes on the calling thread.
    ///
    /// # Errors
    ///
    /// See [`loader::load_grid`].
    pub fn load_bytes(&mut self, bytes: &[u8], kind: SourceKind, options: &LoadOptions) -> Result<()> {
        let options = self.load_options(options);
        let ticket = self.begin_load();
        self.finish_load(ticket, loader::load_grid(bytes, kind, &options))
            .map(|_| ())
    }

    /// First rows of the loaded grid, up to the configured preview limit.
    /// Row indices match the full grid, so a header picked here stays valid.
    pub fn preview(&self) -> Option<Grid> {
        self.grid
            .as_ref()
            .map(|grid| loader::preview(grid, self.settings.preview_row_limit))
    }

    /// Rebuilds the table from the current grid with a different header row.
    ///
    /// # Errors
    ///
    /// `HeaderOutOfRange` when `index` is not a grid row; `Other` when
    /// nothing is loaded. The previous table stays current on failure.
    pub fn set_header_row(&mut self, index: usize) -> Result<()> {
        let Some(grid) = &self.grid else {
            return Err(SheetError::Other("No data loaded".to_owned()));
        };

        // A header change supersedes any load still in flight.
        self.generation += 1;
        self.status = TableStatus::Reloading;

        match materialize(grid, index) {
            Ok(table) => {
                self.header_row = index;
                self.detection = None;
                self.install_table(table);
                Ok(())
            }
            Err(e) => Err(self.fail(TableStatus::ReloadFailed, e)),
        }
    }

    fn fail(&mut self, status: TableStatus, error: SheetError) -> SheetError {
        tracing::warn!("{status:?}: {error}");
        self.status = status;
        self.last_error = Some(error.to_string());
        error
    }

    /// Swaps in a freshly built table. Descriptor overrides carry over for
    /// keys that reappear; filters are cleared and the selection resets to
    /// every column.
    fn install_table(&mut self, table: Table) {
        let previous = std::mem::take(&mut self.descriptors);
        let mut descriptors = infer_columns(
            &table,
            self.settings.type_sample_size,
            self.settings.type_match_threshold,
        );
        for descriptor in &mut descriptors {
            if let Some(old) = previous.iter().find(|d| d.key == descriptor.key) {
                descriptor.assigned_type = old.assigned_type;
                descriptor.sanitize = old.sanitize;
                descriptor.display_name.clone_from(&old.display_name);
                descriptor.preserve_chars.clone_from(&old.preserve_chars);
            }
        }

        tracing::info!(
            "Table ready: {} rows, {} columns (header row {})",
            table.len(),
            table.width(),
            self.header_row
        );

        self.selected_columns = table.columns().to_vec();
        self.history = Some(History::new(
            self.selected_columns.clone(),
            self.settings.history_depth,
        ));
        self.config.filters.clear();
        self.descriptors = descriptors;
        self.table = Some(table);
        self.status = TableStatus::Loaded;
        self.last_error = None;
    }

    fn descriptor_mut(&mut self, key: &str) -> Result<&mut ColumnDescriptor> {
        self.descriptors
            .iter_mut()
            .find(|d| d.key == key)
            .ok_or_else(|| SheetError::Other(format!("Unknown column '{key}'")))
    }

    /// Overrides a column's semantic type; `Auto` reverts to the inferred one.
    ///
    /// # Errors
    ///
    /// `Other` for an unknown column key.
    pub fn set_column_type(&mut self, key: &str, semantic_type: SemanticType) -> Result<()> {
        self.descriptor_mut(key)?.assign_type(semantic_type);
        Ok(())
    }

    /// Sets the export header for a column. The key itself never changes.
    ///
    /// # Errors
    ///
    /// `Other` for an unknown column key.
    pub fn set_display_name(&mut self, key: &str, name: Option<String>) -> Result<()> {
        self.descriptor_mut(key)?.display_name = name;
        Ok(())
    }

    /// # Errors
    ///
    /// `Other` for an unknown column key.
    pub fn set_column_sanitize(&mut self, key: &str, sanitize: bool) -> Result<()> {
        self.descriptor_mut(key)?.sanitize = sanitize;
        Ok(())
    }

    /// Changes the exported column subset and records it for undo. Filters on
    /// columns that are no longer selected are dropped.
    ///
    /// # Errors
    ///
    /// `Other` when a key is not a table column.
    pub fn set_selected_columns(&mut self, columns: Vec<String>) -> Result<()> {
        let table = self
            .table
            .as_ref()
            .ok_or_else(|| SheetError::Other("No table loaded".to_owned()))?;
        if let Some(unknown) = columns.iter().find(|c| !table.has_column(c)) {
            return Err(SheetError::Other(format!("Unknown column '{unknown}'")));
        }

        if let Some(history) = &mut self.history {
            history.push(columns.clone());
        }
        self.apply_selection(columns);
        Ok(())
    }

    fn apply_selection(&mut self, columns: Vec<String>) {
        let before = self.config.filters.len();
        self.config
            .filters
            .retain(|f| columns.iter().any(|c| c == &f.column));
        let pruned = before - self.config.filters.len();
        if pruned > 0 {
            tracing::debug!("Pruned {pruned} filter(s) on deselected columns");
        }
        self.selected_columns = columns;
    }

    /// Steps the column selection back. Returns whether anything changed.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.as_mut().and_then(|h| h.undo().cloned()) else {
            return false;
        };
        self.apply_selection(previous);
        true
    }

    /// Re-applies an undone selection. Returns whether anything changed.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.history.as_mut().and_then(|h| h.redo().cloned()) else {
            return false;
        };
        self.apply_selection(next);
        true
    }

    /// # Errors
    ///
    /// `Other` when the filter's column is not in the table.
    pub fn add_filter(&mut self, filter: FilterPredicate) -> Result<()> {
        let known = self
            .table
            .as_ref()
            .is_some_and(|t| t.has_column(&filter.column));
        if !known {
            return Err(SheetError::Other(format!(
                "Cannot filter on unknown column '{}'",
                filter.column
            )));
        }
        self.config.filters.push(filter);
        Ok(())
    }

    pub fn remove_filter(&mut self, index: usize) -> Option<FilterPredicate> {
        (index < self.config.filters.len()).then(|| self.config.filters.remove(index))
    }

    pub fn clear_filters(&mut self) {
        self.config.filters.clear();
    }

    pub fn set_sanitization(&mut self, options: SanitizationOptions) {
        self.config.sanitization = options;
    }

    pub fn add_format_rule(&mut self, rule: FormatRule) {
        self.config.formatters.push(rule);
    }

    pub fn clear_format_rules(&mut self) {
        self.config.formatters.clear();
    }

    /// Replaces sanitization and formatting, keeping the current filters.
    pub fn set_pipeline_config(&mut self, config: PipelineConfig) {
        let filters = std::mem::take(&mut self.config.filters);
        self.config = PipelineConfig { filters, ..config };
    }

    /// Applies a preset's sanitization options and per-column choices.
    /// Column entries for keys not in the table are ignored.
    pub fn apply_preset(&mut self, preset: &PresetConfig) {
        self.config.sanitization = preset.sanitization_options.clone();

        for descriptor in &mut self.descriptors {
            if let Some(choice) = preset.column_selections.get(&descriptor.key) {
                descriptor.assign_type(choice.semantic_type);
                descriptor.display_name.clone_from(&choice.display_name);
            }
        }

        let Some(table) = &self.table else {
            return;
        };
        let has_choices = table
            .columns()
            .iter()
            .any(|k| preset.column_selections.contains_key(k));
        if has_choices {
            let selected: Vec<String> = table
                .columns()
                .iter()
                .filter(|k| preset.column_selections.get(*k).is_none_or(|c| c.selected))
                .cloned()
                .collect();
            if let Some(history) = &mut self.history {
                history.push(selected.clone());
            }
            self.apply_selection(selected);
        }
    }

    /// Captures the current choices as a preset payload.
    pub fn to_preset_config(&self) -> PresetConfig {
        let column_selections = self
            .descriptors
            .iter()
            .map(|d| {
                let choice = crate::presets::ColumnSelection {
                    semantic_type: d.assigned_type,
                    selected: self.selected_columns.contains(&d.key),
                    display_name: d.display_name.clone(),
                };
                (d.key.clone(), choice)
            })
            .collect();

        PresetConfig {
            sanitization_options: self.config.sanitization.clone(),
            column_selections,
        }
    }

    /// Pipeline output for the current state, rerun only when the grid,
    /// header row, descriptors or pipeline config changed since last time.
    ///
    /// # Errors
    ///
    /// `Other` when no table is loaded; pipeline validation errors otherwise.
    pub fn recompute(&mut self) -> Result<&PipelineOutput> {
        let table = self
            .table
            .as_ref()
            .ok_or_else(|| SheetError::Other("No table loaded".to_owned()))?;

        let key = RecomputeKey {
            grid_version: self.grid_version,
            header_row: self.header_row,
            descriptors: self.descriptors.clone(),
            config: self.config.clone(),
        };

        let fresh = self.cache.as_ref().is_some_and(|(cached, _)| *cached == key);
        if !fresh {
            let output = run_pipeline(table, &self.descriptors, &self.config)?;
            if !table.is_empty() {
                tracing::debug!(
                    "Filters kept {} of rows",
                    crate::utils::fmt_pct(output.table.len() as f64 / table.len() as f64)
                );
            }
            self.pipeline_runs += 1;
            self.cache = Some((key, output));
        }

        self.cache
            .as_ref()
            .map(|(_, output)| output)
            .ok_or_else(|| SheetError::Other("Pipeline output unavailable".to_owned()))
    }

    /// Output headers for the selected columns, keyed by column key.
    pub fn display_names(&self) -> BTreeMap<String, String> {
        self.descriptors
            .iter()
            .filter_map(|d| d.display_name.clone().map(|n| (d.key.clone(), n)))
            .collect()
    }

    /// Runs the pipeline if needed and serializes the selected columns.
    ///
    /// # Errors
    ///
    /// See [`Session::recompute`] and [`export::export`].
    pub fn export(&mut self, format: ExportFormat) -> Result<Vec<u8>> {
        let selected = self.selected_columns.clone();
        let names = self.display_names();
        let output = self.recompute()?;
        export::export(&output.table, &selected, &names, format)
    }

    /// [`Session::export`] in the configured default format.
    ///
    /// # Errors
    ///
    /// See [`Session::export`].
    pub fn export_default(&mut self) -> Result<Vec<u8>> {
        self.export(self.settings.default_export_format)
    }
}

/// Decodes a file on the blocking pool. Pass the options through
/// [`Session::load_options`] to honour the configured default sheet.
pub fn load_in_background(path: PathBuf, options: LoadOptions) -> JoinHandle<Result<Grid>> {
    tokio::task::spawn_blocking(move || loader::load_path(&path, &options))
}

/// Waits for a background load, folding a panicked or cancelled task into a
/// `Load` error.
pub async fn await_load(handle: JoinHandle<Result<Grid>>) -> Result<Grid> {
    handle
        .await
        .map_err(|e| SheetError::Load(format!("Load task failed: {e}")))?
}
