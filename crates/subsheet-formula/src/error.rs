//! Formula error types
//!
//! Each stage has its own taxonomy. Lexer and parser failures render as
//! `#<CODE>` in the grid, evaluator failures as `*<CODE>`.

use thiserror::Error;

/// Result type for tokenizing
pub type LexResult<T> = std::result::Result<T, LexError>;

/// Result type for parsing
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Result type for evaluation
pub type EvalResult<T> = std::result::Result<T, EvalError>;

/// Result type for the full lex → parse → evaluate pipeline
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors raised while tokenizing formula text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum LexError {
    /// Character that is not part of the formula language
    #[error("unrecognized character")]
    InvalidChar,

    /// Run of digits and dots that is not a number
    #[error("malformed numeric literal")]
    InvalidNumber,

    /// Column letters not followed by a row number
    #[error("malformed cell reference")]
    InvalidCell,
}

impl LexError {
    /// Short code shown in the grid
    pub fn code(&self) -> &'static str {
        match self {
            LexError::InvalidChar => "INV_CHAR",
            LexError::InvalidNumber => "INV_NUM",
            LexError::InvalidCell => "INV_CELL",
        }
    }
}

/// Errors raised while parsing a token sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ParseError {
    /// Token that does not fit the grammar at its position
    #[error("unexpected token")]
    UnexpectedToken,

    /// Group or call without its closing parenthesis
    #[error("missing closing parenthesis")]
    NoParen,

    /// Expression nested deeper than the parser allows
    #[error("expression nested too deeply")]
    TooDeep,
}

impl ParseError {
    /// Short code shown in the grid
    pub fn code(&self) -> &'static str {
        match self {
            ParseError::UnexpectedToken => "UNX_TOKEN",
            ParseError::NoParen => "NO_PAREN",
            ParseError::TooDeep => "TOO_DEEP",
        }
    }
}

/// Errors raised while evaluating an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum EvalError {
    /// Operator applied to incompatible operand types
    #[error("operator applied to incompatible types")]
    InvalidOperation,

    /// Value of the wrong runtime type
    #[error("value has the wrong type")]
    InvalidType,

    /// Unknown function name
    #[error("unknown function")]
    InvalidFunction,

    /// Reference to an address outside the grid
    #[error("reference outside the grid")]
    InvalidCell,

    /// Formula reads its own cell
    #[error("formula references its own cell")]
    SelfReference,

    /// Reference chain exceeded the recursion ceiling
    #[error("circular reference")]
    CircularReference,

    /// Wrong number of function arguments
    #[error("wrong number of arguments")]
    InvalidArguments,
}

impl EvalError {
    /// Short code shown in the grid
    pub fn code(&self) -> &'static str {
        match self {
            EvalError::InvalidOperation => "INV_OP",
            EvalError::InvalidType => "INV_TYPE",
            EvalError::InvalidFunction => "INV_FUNC",
            EvalError::InvalidCell => "INV_CELL",
            EvalError::SelfReference => "SELF_REF",
            EvalError::CircularReference => "CIRC_REF",
            EvalError::InvalidArguments => "INV_ARGS",
        }
    }
}

/// Any error from the formula pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum FormulaError {
    /// Tokenizer failure
    #[error("tokenize error: {0}")]
    Lex(#[from] LexError),

    /// Parser failure
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Evaluator failure
    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),
}

impl FormulaError {
    /// Short code of the underlying error
    pub fn code(&self) -> &'static str {
        match self {
            FormulaError::Lex(e) => e.code(),
            FormulaError::Parse(e) => e.code(),
            FormulaError::Eval(e) => e.code(),
        }
    }

    /// Text shown in the grid for this error
    ///
    /// ```
    /// use subsheet_formula::{EvalError, FormulaError, ParseError};
    ///
    /// assert_eq!(FormulaError::from(ParseError::NoParen).marker(), "#NO_PAREN");
    /// assert_eq!(FormulaError::from(EvalError::SelfReference).marker(), "*SELF_REF");
    /// ```
    pub fn marker(&self) -> String {
        match self {
            FormulaError::Lex(_) | FormulaError::Parse(_) => format!("#{}", self.code()),
            FormulaError::Eval(_) => format!("*{}", self.code()),
        }
    }
}

/// Marker shown on every cell of a cross-cell cycle
pub const CIRCULAR_REFERENCE_MARKER: &str = "*CIRC_REF";
