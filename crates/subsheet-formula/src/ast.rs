//! Formula Abstract Syntax Tree types

use crate::evaluator::{format_number, FormulaValue};
use std::fmt;

/// Formula expression AST
///
/// Nodes own their children; there are no parent links.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    /// Number, string or boolean literal
    Literal(FormulaValue),

    // === References ===
    /// Single cell reference, kept as written (e.g. "B3")
    CellRef(String),
    /// Range reference between two cell texts (e.g. "A1".."A3")
    RangeRef { start: String, end: String },

    // === Operators ===
    /// Binary operation
    Binary {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    /// Unary operation
    Unary {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },
    /// Parenthesized expression
    Grouping(Box<FormulaExpr>),

    // === Function call ===
    Call { name: String, args: Vec<FormulaExpr> },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

impl BinaryOperator {
    /// Operator as written in formulas
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// Logical not (`!`)
    Not,
}

impl UnaryOperator {
    /// Operator as written in formulas
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "!",
        }
    }
}

/// Renders the tree in prefix form, e.g. `(- 1 (- 2 3))`
impl fmt::Display for FormulaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaExpr::Literal(FormulaValue::Number(n)) => write!(f, "{}", format_number(*n)),
            FormulaExpr::Literal(FormulaValue::Text(s)) => write!(f, "\"{}\"", s),
            FormulaExpr::Literal(value) => write!(f, "{}", value),
            FormulaExpr::CellRef(cell) => write!(f, "{}", cell),
            FormulaExpr::RangeRef { start, end } => write!(f, "{}..{}", start, end),
            FormulaExpr::Binary { op, left, right } => {
                write!(f, "({} {} {})", op.symbol(), left, right)
            }
            FormulaExpr::Unary { op, operand } => write!(f, "({} {})", op.symbol(), operand),
            FormulaExpr::Grouping(inner) => write!(f, "(group {})", inner),
            FormulaExpr::Call { name, args } => {
                write!(f, "({}", name)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}
