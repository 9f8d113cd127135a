//! Transformation pipeline: Sanitize → Format → Filter.
//!
//! A session's reshaping choices are captured as a [`PipelineConfig`], which
//! serializes to JSON and can be replayed on any table with
//! [`run_pipeline`].
//!
//! # Stages
//!
//! - **Sanitize**: destructive cleanup driven by [`SanitizationOptions`] and
//!   each column's effective semantic type (zip, phone, email, currency, SSN,
//!   dates, HTML, special characters, policy numbers).
//! - **Format**: display shaping via [`FormatRule`]s (text case, number,
//!   currency, percentage, phone pattern, fixed length).
//! - **Filter**: row admission via AND-combined [`FilterPredicate`]s.
//!
//! Sanitizers and formatters keep the row count; filters only drop rows.
//!
//! # Example
//!
//! ```
//! use sheetwise::model::{CellValue, ColumnDescriptor, SemanticType};
//! use sheetwise::pipeline::{FilterOp, FilterPredicate, PipelineConfig, run_pipeline};
//! use sheetwise::table::Table;
//!
//! let table = Table::new(
//!     vec!["phone".into()],
//!     vec![vec![CellValue::text("11234567890")], vec![CellValue::text("n/a")]],
//! );
//! let descriptors = [ColumnDescriptor::new("phone", SemanticType::Phone)];
//!
//! let mut config = PipelineConfig::default();
//! config.filters.push(FilterPredicate::new("phone", FilterOp::Contains("-".into())));
//!
//! let output = run_pipeline(&table, &descriptors, &config)?;
//! assert_eq!(output.table.len(), 1);
//! assert_eq!(output.table.value(0, "phone"), Some(&CellValue::text("123-456-7890")));
//! # Ok::<(), sheetwise::error::SheetError>(())
//! ```

pub mod executor;
pub mod filter;
pub mod format;
pub mod sanitize;
pub mod spec;
pub mod validation;

pub use executor::{PipelineOutput, RunReport, run_pipeline};
pub use filter::{FilterOp, FilterPredicate, filter_table};
pub use format::{FormatRule, Formatter, NumberFormat, PadDirection, TextCase, format_table};
pub use sanitize::{Sanitizer, sanitize_table};
pub use spec::{
    PipelineConfig, PolicyNumberOptions, SanitizationOptions, SpecialCharMode, SsnFormat,
    ZipCountry,
};
pub use validation::{ValidationError, validate_config};
