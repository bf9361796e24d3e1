//! Prelude module - common imports for subsheet users
//!
//! ```rust
//! use subsheet::prelude::*;
//! ```

pub use crate::{
    // Calculation types
    CalculationOptions,
    CalculationStats,
    // Main types
    Cell,
    CellAddress,
    CellRange,
    // Error types
    Error,
    FormulaError,
    FormulaValue,
    Result,
    Worksheet,
    // Extension traits
    WorksheetCalculationExt,
};
