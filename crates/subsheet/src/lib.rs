//! # subsheet
//!
//! A small spreadsheet engine: a grid of cells whose formulas are written in
//! a compact expression language and recalculated in dependency order.
//!
//! ## Features
//!
//! - Formula language with numbers, text, booleans, cell references and ranges
//! - Built-in `if` and `sum`, plus an extensible function registry
//! - Dependency-ordered recalculation with cross-cell cycle detection
//! - Per-cell error markers (`#` for syntax errors, `*` for evaluation errors)
//!
//! ## Example
//!
//! ```rust
//! use subsheet::prelude::*;
//!
//! let mut sheet = Worksheet::default();
//!
//! sheet.set_cell("A1", "1").unwrap();
//! sheet.set_cell("A2", "2").unwrap();
//! sheet.set_cell("B1", "=sum(A1..A2)").unwrap();
//! sheet.set_cell("B2", "=if(B1 > 2, \"many\", \"few\")").unwrap();
//!
//! sheet.calculate().unwrap();
//!
//! assert_eq!(sheet.get_display("B1").unwrap(), "3");
//! assert_eq!(sheet.get_display("B2").unwrap(), "many");
//! ```

pub mod calculation;
pub mod prelude;

// Re-export calculation types
pub use calculation::{CalculationOptions, CalculationStats, WorksheetCalculationExt};

// Re-export core types
pub use subsheet_core::{
    Cell, CellAddress, CellRange, Error, Result, Worksheet, DEFAULT_COLS, DEFAULT_ROWS,
    FORMULA_SIGIL,
};

// Re-export formula types
pub use subsheet_formula::{
    evaluate, evaluate_formula, evaluate_source, parse_formula, render_result, tokenize,
    CellQuery, EvalDepth, EvalError, EvalResult, EvaluationContext, FormulaError, FormulaExpr,
    FormulaResult, FormulaValue, FunctionDef, FunctionRegistry, LexError, ParseError, Token,
};

/// Formula language internals
pub use subsheet_formula as formula;
