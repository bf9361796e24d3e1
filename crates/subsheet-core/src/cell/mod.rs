//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellRange`] - An inclusive rectangle of cells (e.g., "A1..B3")
//! - [`Cell`] - Raw content plus cached display text

mod address;
mod data;

pub use address::{CellAddress, CellRange, CellRangeIterator};
pub use data::Cell;
