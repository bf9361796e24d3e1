//! Logical functions

use crate::error::{EvalError, EvalResult};
use crate::evaluator::{EvaluationContext, FormulaValue};

/// IF takes a Boolean condition
pub fn check_if(args: &[FormulaValue]) -> bool {
    matches!(args.first(), Some(FormulaValue::Boolean(_)))
}

/// IF function
///
/// Both branches arrive already evaluated; IF only selects one.
pub fn fn_if(args: &[FormulaValue], _ctx: &mut EvaluationContext) -> EvalResult<FormulaValue> {
    let condition = args
        .first()
        .and_then(FormulaValue::as_bool)
        .ok_or(EvalError::InvalidType)?;

    let branch = if condition { args.get(1) } else { args.get(2) };
    branch.cloned().ok_or(EvalError::InvalidArguments)
}
