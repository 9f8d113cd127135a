//! Core data model: cell values, grids and per-column descriptors.

use chrono::{NaiveDate, NaiveDateTime, Timelike as _};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A primitive cell value as produced by the source codecs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CellValue {
    #[default]
    Empty,
    String(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    /// True for `Empty` and for strings that are blank after trimming.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// True for non-empty string cells.
    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(s) if !s.trim().is_empty())
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Date reading of the cell: date cells as-is, strings via [`parse_date`].
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Date(d) => Some(*d),
            Self::String(s) => parse_date(s),
            _ => None,
        }
    }

    /// String form used by inference, sanitizers and CSV export.
    pub fn render(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::String(s) => s.clone(),
            Self::Number(n) => render_number(*n),
            Self::Bool(b) => b.to_string(),
            Self::Date(d) => {
                if d.time().num_seconds_from_midnight() == 0 {
                    d.format("%Y-%m-%d").to_string()
                } else {
                    d.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Integral values render without a fractional part (`30`, not `30.0`).
fn render_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M",
];

// Month-first wins over day-first for ambiguous slash dates. Two-digit
// years are tried first because `%Y` would accept them as years 0-99.
const DATE_FORMATS: [&str; 8] = [
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%y", "%m/%d/%Y", "%m-%d-%Y", "%d.%m.%Y", "%d/%m/%Y", "%b %d, %Y",
];

/// Parses the date shapes commonly typed into spreadsheets.
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

pub type Row = Vec<CellValue>;

/// Raw 2-D cell data with no header assumption.
pub type Grid = Vec<Row>;

/// A column's real-world meaning, distinct from its storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    #[default]
    Auto,
    Text,
    Number,
    Date,
    Zipcode,
    Phone,
    Email,
    Currency,
    Ssn,
    Boolean,
    Unknown,
}

impl SemanticType {
    pub const ALL: [Self; 11] = [
        Self::Auto,
        Self::Text,
        Self::Number,
        Self::Date,
        Self::Zipcode,
        Self::Phone,
        Self::Email,
        Self::Currency,
        Self::Ssn,
        Self::Boolean,
        Self::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Zipcode => "zipcode",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Currency => "currency",
            Self::Ssn => "ssn",
            Self::Boolean => "boolean",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-column settings that drive sanitization and export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub key: String,
    /// Verdict of the type inferencer at table creation
    pub inferred_type: SemanticType,
    /// User override; `Auto` means "use the inferred type"
    pub assigned_type: SemanticType,
    pub sanitize: bool,
    /// Characters exempt from special-character stripping
    pub preserve_chars: BTreeSet<char>,
    /// Output header on export; the key itself never changes
    pub display_name: Option<String>,
}

impl ColumnDescriptor {
    pub fn new(key: impl Into<String>, inferred_type: SemanticType) -> Self {
        Self {
            key: key.into(),
            inferred_type,
            assigned_type: SemanticType::Auto,
            sanitize: true,
            preserve_chars: crate::inference::default_preserve_chars(inferred_type),
            display_name: None,
        }
    }

    /// The single type that sanitization dispatches on.
    pub fn effective_type(&self) -> SemanticType {
        if self.assigned_type == SemanticType::Auto {
            self.inferred_type
        } else {
            self.assigned_type
        }
    }

    /// Assign a type and reseed the preserve set from its defaults.
    pub fn assign_type(&mut self, semantic_type: SemanticType) {
        self.assigned_type = semantic_type;
        self.preserve_chars = crate::inference::default_preserve_chars(self.effective_type());
    }

    pub fn output_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.key)
    }
}
