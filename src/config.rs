use crate::error::Result;
use crate::export::ExportFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tunables for detection, inference and the session layer.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    /// Rows scanned for label-like header candidates
    pub header_scan_rows: usize,
    /// Rows scanned by the type-transition and first-dense-row fallbacks
    pub fallback_scan_rows: usize,
    /// Maximum non-empty values sampled per column during type inference
    pub type_sample_size: usize,
    /// Share of sampled values that must match a pattern for a type to win
    pub type_match_threshold: f64,
    /// Rows returned by loader previews
    pub preview_row_limit: usize,
    /// Undo/redo stack depth
    pub history_depth: usize,
    /// Sheet to read when none is named explicitly
    pub default_sheet: Option<String>,
    pub default_export_format: ExportFormat,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            header_scan_rows: 15,
            fallback_scan_rows: 10,
            type_sample_size: 100,
            type_match_threshold: 0.6,
            preview_row_limit: 15,
            history_depth: 50,
            default_sheet: None,
            default_export_format: ExportFormat::Xlsx,
        }
    }
}

pub fn get_config_path() -> PathBuf {
    crate::utils::standard_paths().base_dir.join("config.json")
}

/// Loads settings, falling back to defaults when the file is missing or unreadable.
pub fn load_app_settings() -> AppSettings {
    load_app_settings_from(&get_config_path())
}

pub fn load_app_settings_from(path: &Path) -> AppSettings {
    if path.exists()
        && let Ok(content) = std::fs::read_to_string(path)
    {
        match serde_json::from_str::<AppSettings>(&content) {
            Ok(settings) => return settings,
            Err(e) => tracing::warn!("Ignoring unreadable settings at {}: {e}", path.display()),
        }
    }

    AppSettings::default()
}

pub fn save_app_settings(settings: &AppSettings) -> Result<()> {
    save_app_settings_to(settings, &get_config_path())
}

pub fn save_app_settings_to(settings: &AppSettings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, content)?;
    Ok(())
}
