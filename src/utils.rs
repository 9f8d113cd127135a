use std::path::PathBuf;

/// Application directory name under the platform data directory.
pub const APP_DIR_NAME: &str = "sheetwise";

/// Platform-specific locations used for settings, presets and logs.
#[derive(Debug, Clone)]
pub struct StandardPaths {
    pub base_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub store_dir: PathBuf,
}

/// Resolves the data directory, falling back to the working directory when
/// the platform exposes none (containers, CI).
pub fn standard_paths() -> StandardPaths {
    let base_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME);

    StandardPaths {
        logs_dir: base_dir.join("logs"),
        store_dir: base_dir.join("store"),
        base_dir,
    }
}

/// Formats a ratio as a whole-number percentage for log lines.
pub fn fmt_pct(ratio: f64) -> String {
    if ratio.is_finite() {
        format!("{:.0}%", ratio * 100.0)
    } else {
        "n/a".to_owned()
    }
}
