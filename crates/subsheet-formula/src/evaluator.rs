//! Formula evaluator
//!
//! Evaluates formula ASTs to produce values.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{EvalError, EvalResult, FormulaResult};
use crate::functions::{builtin_functions, FunctionRegistry};
use crate::lexer::tokenize;
use crate::parser::parse;
use subsheet_core::{CellAddress, CellRange, FORMULA_SIGIL};
use std::fmt;

/// Default ceiling for nested cell reads
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Ceiling for expression nesting, summed over nested cell reads
///
/// Above [`MAX_PARSE_DEPTH`](crate::parser::MAX_PARSE_DEPTH) so a single
/// formula that parses never reaches it on its own.
pub const MAX_NESTING_DEPTH: usize = 512;

/// How deep an evaluation has recursed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalDepth {
    /// Cell reads in progress
    pub reads: usize,
    /// Expression nodes in progress, across nested cells
    pub nodes: usize,
}

/// Value types during formula evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    Boolean(bool),
    Text(String),
    /// Unexpanded range, only meaningful as a function argument
    Range(CellRange),
}

impl FormulaValue {
    /// Number payload, if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Boolean payload, if this is a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FormulaValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Range payload, if this is a range
    pub fn as_range(&self) -> Option<&CellRange> {
        match self {
            FormulaValue::Range(range) => Some(range),
            _ => None,
        }
    }

    /// Name of the runtime type, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            FormulaValue::Number(_) => "number",
            FormulaValue::Boolean(_) => "boolean",
            FormulaValue::Text(_) => "text",
            FormulaValue::Range(_) => "range",
        }
    }

    /// Text shown in the grid for a successful result
    ///
    /// A range cannot be shown and yields [`EvalError::InvalidType`].
    pub fn to_display_text(&self) -> EvalResult<String> {
        match self {
            FormulaValue::Range(_) => Err(EvalError::InvalidType),
            other => Ok(other.to_string()),
        }
    }
}

impl fmt::Display for FormulaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaValue::Number(n) => f.write_str(&format_number(*n)),
            FormulaValue::Boolean(true) => f.write_str("True"),
            FormulaValue::Boolean(false) => f.write_str("False"),
            FormulaValue::Text(s) => f.write_str(s),
            FormulaValue::Range(range) => f.write_str(&range.to_a1_string()),
        }
    }
}

/// Format a number with at most six fractional digits
///
/// ```
/// use subsheet_formula::format_number;
///
/// assert_eq!(format_number(3.0), "3");
/// assert_eq!(format_number(1.0 / 3.0), "0.333333");
/// assert_eq!(format_number(2.50), "2.5");
/// ```
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let mut text = format!("{:.6}", n);
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }

    if text == "-0" {
        text.remove(0);
    }
    text
}

/// Parse cell text as a number, ignoring surrounding whitespace
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

/// Cell text read through a reference becomes a number only when it parses
/// and contains none of `f`, `d`, `e`.
fn coerce_cell_text(text: String) -> FormulaValue {
    if !text.contains(|c| matches!(c, 'f' | 'd' | 'e')) {
        if let Some(n) = parse_number(&text) {
            return FormulaValue::Number(n);
        }
    }
    FormulaValue::Text(text)
}

/// Read access to the sheet a formula is evaluated against
pub trait CellQuery {
    /// Current display text of a cell
    ///
    /// If the target is an unresolved formula cell it is computed first,
    /// continuing at `depth`. Addresses outside the grid yield
    /// [`EvalError::InvalidCell`].
    fn read_display_text(&mut self, address: CellAddress, depth: EvalDepth) -> EvalResult<String>;

    /// Address of the cell being evaluated
    fn self_address(&self) -> CellAddress;
}

/// Context for formula evaluation
pub struct EvaluationContext<'a> {
    query: &'a mut dyn CellQuery,
    registry: &'a FunctionRegistry,
    depth: EvalDepth,
    max_depth: usize,
}

impl<'a> EvaluationContext<'a> {
    /// Create a context using the built-in functions and default ceiling
    pub fn new(query: &'a mut dyn CellQuery) -> Self {
        Self {
            query,
            registry: builtin_functions(),
            depth: EvalDepth::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Use a custom function registry
    pub fn with_registry(mut self, registry: &'a FunctionRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Set the ceiling for nested cell reads
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Start at an existing depth (nested evaluation of a referenced cell)
    pub fn with_depth(mut self, depth: EvalDepth) -> Self {
        self.depth = depth;
        self
    }

    pub fn depth(&self) -> EvalDepth {
        self.depth
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn registry(&self) -> &'a FunctionRegistry {
        self.registry
    }

    /// Address of the cell being evaluated
    pub fn self_address(&self) -> CellAddress {
        self.query.self_address()
    }

    /// Read a cell's display text, counting one nested read
    pub fn read_cell(&mut self, address: CellAddress) -> EvalResult<String> {
        if self.depth.reads >= self.max_depth {
            return Err(EvalError::CircularReference);
        }
        self.depth.reads += 1;
        let text = self.query.read_display_text(address, self.depth);
        self.depth.reads -= 1;
        text
    }

    fn enter_node(&mut self) -> EvalResult<()> {
        if self.depth.nodes >= MAX_NESTING_DEPTH {
            return Err(EvalError::CircularReference);
        }
        self.depth.nodes += 1;
        Ok(())
    }

    fn leave_node(&mut self) {
        self.depth.nodes = self.depth.nodes.saturating_sub(1);
    }
}

/// Tokenize, parse and evaluate formula text
///
/// A leading `=` sigil is optional.
pub fn evaluate_formula(formula: &str, ctx: &mut EvaluationContext) -> FormulaResult<FormulaValue> {
    let source = formula.strip_prefix(FORMULA_SIGIL).unwrap_or(formula);
    evaluate_source(source, ctx)
}

/// Tokenize, parse and evaluate formula source (the text after the sigil)
pub fn evaluate_source(source: &str, ctx: &mut EvaluationContext) -> FormulaResult<FormulaValue> {
    let tokens = tokenize(source)?;
    let expr = parse(&tokens)?;
    Ok(evaluate(&expr, ctx)?)
}

/// Display text for the outcome of a formula
///
/// Successes render their value; failures render their error marker.
pub fn render_result(result: FormulaResult<FormulaValue>) -> String {
    match result.and_then(|value| Ok(value.to_display_text()?)) {
        Ok(text) => text,
        Err(e) => e.marker(),
    }
}

/// Evaluate a formula expression
pub fn evaluate(expr: &FormulaExpr, ctx: &mut EvaluationContext) -> EvalResult<FormulaValue> {
    ctx.enter_node()?;
    let result = evaluate_node(expr, ctx);
    ctx.leave_node();
    result
}

fn evaluate_node(expr: &FormulaExpr, ctx: &mut EvaluationContext) -> EvalResult<FormulaValue> {
    match expr {
        FormulaExpr::Literal(value) => Ok(value.clone()),

        FormulaExpr::Grouping(inner) => evaluate(inner, ctx),

        // === References ===
        FormulaExpr::CellRef(text) => {
            let address = resolve_address(text)?;
            if address == ctx.self_address() {
                return Err(EvalError::SelfReference);
            }
            let display = ctx.read_cell(address)?;
            Ok(coerce_cell_text(display))
        }

        FormulaExpr::RangeRef { start, end } => {
            let start = resolve_address(start)?;
            let end = resolve_address(end)?;
            Ok(FormulaValue::Range(CellRange::new(start, end)))
        }

        // === Operators ===
        FormulaExpr::Binary { op, left, right } => evaluate_binary_op(*op, left, right, ctx),

        FormulaExpr::Unary { op, operand } => evaluate_unary_op(*op, operand, ctx),

        // === Functions ===
        FormulaExpr::Call { name, args } => evaluate_function(name, args, ctx),
    }
}

fn resolve_address(text: &str) -> EvalResult<CellAddress> {
    CellAddress::parse(text).map_err(|_| EvalError::InvalidCell)
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &FormulaExpr,
    right: &FormulaExpr,
    ctx: &mut EvaluationContext,
) -> EvalResult<FormulaValue> {
    // Evaluate operands first
    let left_val = evaluate(left, ctx)?;
    let right_val = evaluate(right, ctx)?;

    match op {
        BinaryOperator::Add => add_values(left_val, right_val),

        BinaryOperator::Subtract => numeric(&left_val, &right_val, |l, r| l - r),
        BinaryOperator::Multiply => numeric(&left_val, &right_val, |l, r| l * r),
        BinaryOperator::Divide => numeric(&left_val, &right_val, |l, r| l / r),

        BinaryOperator::Equal => Ok(FormulaValue::Boolean(left_val == right_val)),
        BinaryOperator::NotEqual => Ok(FormulaValue::Boolean(left_val != right_val)),

        BinaryOperator::LessThan => compare(&left_val, &right_val, |l, r| l < r),
        BinaryOperator::LessEqual => compare(&left_val, &right_val, |l, r| l <= r),
        BinaryOperator::GreaterThan => compare(&left_val, &right_val, |l, r| l > r),
        BinaryOperator::GreaterEqual => compare(&left_val, &right_val, |l, r| l >= r),
    }
}

/// `+` adds numbers and concatenates when text is involved
fn add_values(left: FormulaValue, right: FormulaValue) -> EvalResult<FormulaValue> {
    match (left, right) {
        (FormulaValue::Number(l), FormulaValue::Number(r)) => Ok(FormulaValue::Number(l + r)),
        (
            l @ (FormulaValue::Number(_) | FormulaValue::Text(_)),
            r @ (FormulaValue::Number(_) | FormulaValue::Text(_)),
        ) => Ok(FormulaValue::Text(format!("{}{}", l, r))),
        _ => Err(EvalError::InvalidOperation),
    }
}

fn numeric(
    left: &FormulaValue,
    right: &FormulaValue,
    f: impl Fn(f64, f64) -> f64,
) -> EvalResult<FormulaValue> {
    match (left, right) {
        (FormulaValue::Number(l), FormulaValue::Number(r)) => Ok(FormulaValue::Number(f(*l, *r))),
        _ => Err(EvalError::InvalidOperation),
    }
}

fn compare(
    left: &FormulaValue,
    right: &FormulaValue,
    f: impl Fn(f64, f64) -> bool,
) -> EvalResult<FormulaValue> {
    match (left, right) {
        (FormulaValue::Number(l), FormulaValue::Number(r)) => Ok(FormulaValue::Boolean(f(*l, *r))),
        _ => Err(EvalError::InvalidOperation),
    }
}

/// Evaluate a unary operation
fn evaluate_unary_op(
    op: UnaryOperator,
    operand: &FormulaExpr,
    ctx: &mut EvaluationContext,
) -> EvalResult<FormulaValue> {
    let val = evaluate(operand, ctx)?;

    match op {
        UnaryOperator::Not => match val {
            FormulaValue::Boolean(b) => Ok(FormulaValue::Boolean(!b)),
            _ => Err(EvalError::InvalidOperation),
        },
    }
}

/// Evaluate a function call
///
/// The name is resolved before any argument is evaluated; every argument is
/// evaluated, left to right, before the function runs.
fn evaluate_function(
    name: &str,
    args: &[FormulaExpr],
    ctx: &mut EvaluationContext,
) -> EvalResult<FormulaValue> {
    let registry = ctx.registry();
    let func = registry.get(name).ok_or(EvalError::InvalidFunction)?;

    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(evaluate(arg, ctx)?);
    }

    func.call(&values, ctx)
}
