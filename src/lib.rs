//! # Sheetwise - Spreadsheet Cleanup Library
//!
//! Sheetwise turns messy workbooks, CSV files and tabular PDF text into a
//! clean table. It finds the header row, infers what each column holds,
//! runs a sanitize/format/filter pipeline over the values and exports the
//! result as CSV or a single-sheet workbook.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sheetwise::export::ExportFormat;
//! use sheetwise::loader::{LoadOptions, SourceKind};
//! use sheetwise::session::Session;
//!
//! # fn example() -> sheetwise::error::Result<()> {
//! let bytes = std::fs::read("contacts.xlsx")?;
//! let mut session = Session::default();
//! session.load_bytes(&bytes, SourceKind::Workbook, &LoadOptions::default())?;
//!
//! for column in session.descriptors() {
//!     println!("{}: {}", column.key, column.effective_type());
//! }
//!
//! let csv = session.export(ExportFormat::Csv)?;
//! std::fs::write("contacts.clean.csv", csv)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Modules
//!
//! - [`loader`]: decoding workbooks, delimited text and PDF text into a raw grid
//! - [`detect`]: header row detection over the first rows of a grid
//! - [`table`]: keyed tables built from a grid and a header row
//! - [`inference`]: semantic column types (zip, phone, email, SSN, ...)
//! - [`pipeline`]: sanitize, format and filter stages
//! - [`presets`]: named sanitization settings persisted in a key-value store
//! - [`session`]: single-document state with load generations and undo
//! - [`export`]: CSV and workbook output
//! - [`config`], [`logging`], [`error`], [`utils`]: ambient plumbing
//!
//! ## Key Concepts
//!
//! ### Rebuild, don't patch
//!
//! Every stage takes a table and returns a new one. Changing the header row
//! or the pipeline configuration reruns the stages from the raw grid, so the
//! output always reflects the current choices and nothing else.
//!
//! ### Column type is the source of truth
//!
//! Sanitization dispatches on a column's effective type (the user's choice,
//! or the inferred one when the user chose `Auto`). Per-value detection only
//! runs for text-like columns.

#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod detect;
pub mod error;
pub mod export;
pub mod inference;
pub mod loader;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod presets;
pub mod session;
pub mod table;
pub mod utils;
