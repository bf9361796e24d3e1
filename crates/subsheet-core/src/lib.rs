//! # subsheet-core
//!
//! Core data structures for the subsheet spreadsheet engine.
//!
//! This crate provides the fundamental types used throughout subsheet:
//! - [`CellAddress`] and [`CellRange`] - Cell addressing and ranges
//! - [`Cell`] - Raw content plus cached display text
//! - [`Worksheet`] - The fixed-size grid of cells
//!
//! ## Example
//!
//! ```rust
//! use subsheet_core::{CellAddress, Worksheet};
//!
//! let mut sheet = Worksheet::default();
//! sheet.set_cell("A1", "Hello").unwrap();
//! sheet.set_content_at(CellAddress::new(2, 1), "=A1").unwrap();
//!
//! assert_eq!(sheet.get_display("A1").unwrap(), "Hello");
//! ```

pub mod cell;
pub mod error;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{Cell, CellAddress, CellRange, CellRangeIterator};
pub use error::{Error, Result};
pub use worksheet::Worksheet;

/// Character that marks cell content as a formula
pub const FORMULA_SIGIL: char = '=';

/// Default number of rows in a worksheet
pub const DEFAULT_ROWS: u32 = 40;

/// Default number of columns in a worksheet (A-Z)
pub const DEFAULT_COLS: u32 = 26;
