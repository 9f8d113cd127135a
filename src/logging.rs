//! Logging infrastructure for sheetwise.
//!
//! Logs go to the console and to a daily-rotating file in the app data
//! directory. Library code only emits `tracing` events; installing the
//! subscriber is left to the embedding shell.
//!
//! ```no_run
//! sheetwise::logging::init().expect("Failed to initialize logging");
//! tracing::info!("App started");
//! ```

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Gets the log directory path, creating it if needed.
pub fn get_log_dir() -> Result<PathBuf> {
    let log_dir = crate::utils::standard_paths().logs_dir;

    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

/// Initializes console and file logging.
///
/// The level defaults to INFO and can be overridden with `RUST_LOG`.
///
/// # Errors
///
/// Returns error if the log directory cannot be created or the file appender fails
pub fn init() -> Result<()> {
    let log_dir = get_log_dir()?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(10)
        .filename_prefix("sheetwise")
        .filename_suffix("log")
        .build(&log_dir)
        .context("Failed to create file appender")?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to create env filter")?;

    let stdout_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .with_file(true);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(file_appender);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!("Logging initialized, log directory: {}", log_dir.display());

    Ok(())
}

/// Gets the path to today's log file
pub fn get_current_log_path() -> Result<PathBuf> {
    let log_dir = get_log_dir()?;
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    Ok(log_dir.join(format!("sheetwise.{today}.log")))
}
