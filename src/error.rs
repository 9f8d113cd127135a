//! Centralized error handling for sheetwise.
//!
//! Every stage that can fail in a way the caller must distinguish returns a
//! [`SheetError`]. Stage-local conditions (one cell failing to parse, one
//! preset record being unreadable) never surface here; they are logged and the
//! value or entry is left unchanged.
//!
//! ```
//! use sheetwise::error::SheetError;
//!
//! fn describe(err: &SheetError) -> &'static str {
//!     match err {
//!         SheetError::HeaderOutOfRange { .. } => "pick another header row",
//!         SheetError::EmptySource(_) => "nothing to load",
//!         _ => "load failed",
//!     }
//! }
//! ```

use std::fmt;

/// Main error type for sheetwise operations.
#[derive(Debug)]
pub enum SheetError {
    /// Unreadable or corrupt source (workbook container, CSV, extracted PDF text)
    Load(String),

    /// Source has zero sheets or zero usable rows
    EmptySource(String),

    /// Requested header row is beyond the grid
    HeaderOutOfRange { index: usize, rows: usize },

    /// Serialization of the output table failed
    Export(String),

    /// A stored preset record could not be decoded
    PresetCorruption(String),

    /// I/O errors (file operations)
    Io(std::io::Error),

    /// Configuration errors
    Config(String),

    /// Generic error with context
    Other(String),
}

impl fmt::Display for SheetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load(msg) => write!(f, "Load error: {msg}"),
            Self::EmptySource(msg) => write!(f, "Empty source: {msg}"),
            Self::HeaderOutOfRange { index, rows } => write!(
                f,
                "Header row {index} is out of range (grid has {rows} rows)"
            ),
            Self::Export(msg) => write!(f, "Export error: {msg}"),
            Self::PresetCorruption(msg) => write!(f, "Corrupt preset: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for SheetError {}

impl From<std::io::Error> for SheetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for SheetError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<serde_json::Error> for SheetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<csv::Error> for SheetError {
    fn from(err: csv::Error) -> Self {
        Self::Load(format!("CSV error: {err}"))
    }
}

impl From<calamine::Error> for SheetError {
    fn from(err: calamine::Error) -> Self {
        Self::Load(format!("Workbook error: {err}"))
    }
}

impl From<rust_xlsxwriter::XlsxError> for SheetError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::Export(format!("Workbook writer error: {err}"))
    }
}

/// Result type alias for sheetwise operations.
pub type Result<T> = std::result::Result<T, SheetError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<SheetError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_prefix(msg.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_prefix(f()))
    }
}

impl SheetError {
    /// Prefix the message while keeping the error kind, so callers can still
    /// match on `Load`/`Export` after context was attached.
    fn with_prefix(self, prefix: String) -> Self {
        match self {
            Self::Load(msg) => Self::Load(format!("{prefix}: {msg}")),
            Self::EmptySource(msg) => Self::EmptySource(format!("{prefix}: {msg}")),
            Self::Export(msg) => Self::Export(format!("{prefix}: {msg}")),
            Self::PresetCorruption(msg) => Self::PresetCorruption(format!("{prefix}: {msg}")),
            Self::Config(msg) => Self::Config(format!("{prefix}: {msg}")),
            other @ Self::HeaderOutOfRange { .. } => other,
            other => Self::Other(format!("{prefix}: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SheetError::HeaderOutOfRange { index: 7, rows: 3 };
        assert_eq!(
            err.to_string(),
            "Header row 7 is out of range (grid has 3 rows)"
        );
    }

    #[test]
    fn test_context_keeps_kind() {
        let result: Result<()> = Err(SheetError::Load("bad zip".to_owned()));
        let result = result.context("Failed to open workbook");
        match result {
            Err(SheetError::Load(msg)) => {
                assert_eq!(msg, "Failed to open workbook: bad zip");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_io_context() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file.xlsx",
        ));

        let result: Result<()> = result.context("Failed to read file");
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read file")
        );
    }
}
