//! # subsheet-formula
//!
//! Formula language for subsheet.
//!
//! This crate provides:
//! - Tokenizing (text → tokens)
//! - Parsing (tokens → AST)
//! - Evaluation (AST → value) against a [`CellQuery`]
//! - The built-in functions `if` and `sum`, in an extensible registry
//! - Reference scanning and cycle-aware scheduling for recomputation
//!
//! ## Example
//!
//! ```rust,ignore
//! use subsheet_formula::{evaluate_formula, EvaluationContext};
//!
//! let mut ctx = EvaluationContext::new(&mut sheet_query);
//! let value = evaluate_formula("=sum(A1..A10) * 2", &mut ctx)?;
//! ```

pub mod ast;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod parser;

pub use ast::{BinaryOperator, FormulaExpr, UnaryOperator};
pub use dependency::{extract_references, formula_references, DependencyGraph, Schedule};
pub use error::{
    EvalError, EvalResult, FormulaError, FormulaResult, LexError, LexResult, ParseError,
    ParseResult, CIRCULAR_REFERENCE_MARKER,
};
pub use evaluator::{
    evaluate, evaluate_formula, evaluate_source, format_number, parse_number, render_result,
    CellQuery, EvalDepth, EvaluationContext, FormulaValue, DEFAULT_MAX_DEPTH, MAX_NESTING_DEPTH,
};
pub use functions::{builtin_functions, Arity, FunctionDef, FunctionRegistry};
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::{parse, parse_formula, MAX_PARSE_DEPTH};
