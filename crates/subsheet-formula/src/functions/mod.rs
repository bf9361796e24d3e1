//! Built-in formula functions

pub mod logical;
pub mod math;

use crate::error::{EvalError, EvalResult};
use crate::evaluator::{EvaluationContext, FormulaValue};
use ahash::AHashMap;
use std::sync::OnceLock;

/// Function implementation signature
///
/// Functions receive their already-evaluated arguments. The context gives
/// range-consuming functions read access to the sheet.
pub type FunctionImpl = fn(&[FormulaValue], &mut EvaluationContext) -> EvalResult<FormulaValue>;

/// Argument type predicate, run after the arity check
pub type TypeCheck = fn(&[FormulaValue]) -> bool;

/// Accepted argument counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
    /// Inclusive bounds
    Between(usize, usize),
}

impl Arity {
    pub fn matches(&self, count: usize) -> bool {
        match *self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(min) => count >= min,
            Arity::Between(min, max) => (min..=max).contains(&count),
        }
    }
}

/// Function definition
#[derive(Clone, Copy)]
pub struct FunctionDef {
    /// Function name as written in formulas (lowercase)
    pub name: &'static str,
    pub arity: Arity,
    pub check_types: TypeCheck,
    pub implementation: FunctionImpl,
}

impl FunctionDef {
    /// Check arity, then argument types, then run the body
    pub fn call(&self, args: &[FormulaValue], ctx: &mut EvaluationContext) -> EvalResult<FormulaValue> {
        if !self.arity.matches(args.len()) {
            return Err(EvalError::InvalidArguments);
        }
        if !(self.check_types)(args) {
            return Err(EvalError::InvalidType);
        }
        (self.implementation)(args, ctx)
    }
}

impl std::fmt::Debug for FunctionDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionDef")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// Function registry
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    functions: AHashMap<&'static str, FunctionDef>,
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self::empty();

        registry.register_logical_functions();
        registry.register_math_functions();

        registry
    }

    /// Create a registry with no functions
    pub fn empty() -> Self {
        Self {
            functions: AHashMap::new(),
        }
    }

    /// Look up a function by name (exact match)
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name)
    }

    /// Register a function, replacing any previous definition of that name
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name, def);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.functions.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    fn register_logical_functions(&mut self) {
        // IF
        self.register(FunctionDef {
            name: "if",
            arity: Arity::Exactly(3),
            check_types: logical::check_if,
            implementation: logical::fn_if,
        });
    }

    fn register_math_functions(&mut self) {
        // SUM
        self.register(FunctionDef {
            name: "sum",
            arity: Arity::Exactly(1),
            check_types: math::check_sum,
            implementation: math::fn_sum,
        });
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global registry of built-in functions (lazily initialized)
static BUILTIN_FUNCTIONS: OnceLock<FunctionRegistry> = OnceLock::new();

/// Shared registry holding the built-in functions
pub fn builtin_functions() -> &'static FunctionRegistry {
    BUILTIN_FUNCTIONS.get_or_init(FunctionRegistry::new)
}
