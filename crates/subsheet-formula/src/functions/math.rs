//! Math functions

use crate::error::{EvalError, EvalResult};
use crate::evaluator::{parse_number, EvaluationContext, FormulaValue};

/// SUM takes a single range
pub fn check_sum(args: &[FormulaValue]) -> bool {
    matches!(args.first(), Some(FormulaValue::Range(_)))
}

/// SUM function
///
/// Reads every cell of the range row-major. Empty cells count as zero; any
/// other text that is not a number, whitespace included, fails the whole call.
pub fn fn_sum(args: &[FormulaValue], ctx: &mut EvaluationContext) -> EvalResult<FormulaValue> {
    let range = args
        .first()
        .and_then(FormulaValue::as_range)
        .ok_or(EvalError::InvalidType)?;

    let mut sum = 0.0;

    for address in range.cells() {
        let text = ctx.read_cell(address)?;
        if let Some(n) = parse_number(&text) {
            sum += n;
        } else if !text.is_empty() {
            return Err(EvalError::InvalidType);
        }
    }

    Ok(FormulaValue::Number(sum))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::evaluate_formula;
    use crate::evaluator::tests::MapQuery;
    use crate::FormulaError;
    use pretty_assertions::assert_eq;
    use subsheet_core::CellAddress;

    fn sum_over(query: &mut MapQuery, formula: &str) -> Result<FormulaValue, FormulaError> {
        let mut ctx = EvaluationContext::new(query);
        evaluate_formula(formula, &mut ctx)
    }

    #[test]
    fn test_sum_skips_empty_cells() {
        let mut query = MapQuery::new("C1").with("A1", "1").with("A2", "").with("A3", "2");
        assert_eq!(sum_over(&mut query, "=sum(A1..A3)"), Ok(FormulaValue::Number(3.0)));
    }

    #[test]
    fn test_sum_rejects_text() {
        let mut query = MapQuery::new("C1").with("A1", "1").with("A2", "x").with("A3", "2");
        assert_eq!(
            sum_over(&mut query, "=sum(A1..A3)"),
            Err(FormulaError::Eval(EvalError::InvalidType))
        );
    }

    #[test]
    fn test_sum_rejects_blank_text() {
        let mut query = MapQuery::new("C1").with("A1", "1").with("A2", "  ").with("A3", " 2 ");
        assert_eq!(
            sum_over(&mut query, "=sum(A1..A3)"),
            Err(FormulaError::Eval(EvalError::InvalidType))
        );
        assert_eq!(sum_over(&mut query, "=sum(A3..A3)"), Ok(FormulaValue::Number(2.0)));
    }

    #[test]
    fn test_sum_parses_exponents() {
        let mut query = MapQuery::new("C1").with("A1", "1e2").with("B1", "0.5");
        assert_eq!(sum_over(&mut query, "=sum(A1..B1)"), Ok(FormulaValue::Number(100.5)));
    }

    #[test]
    fn test_sum_reads_row_major() {
        let mut query = MapQuery::new("D1");
        sum_over(&mut query, "=sum(B2..A1)").unwrap();
        assert_eq!(
            query.reads,
            vec![
                CellAddress::new(1, 1),
                CellAddress::new(2, 1),
                CellAddress::new(1, 2),
                CellAddress::new(2, 2),
            ]
        );
    }

    #[test]
    fn test_sum_argument_checks() {
        let mut query = MapQuery::new("C1");
        assert_eq!(
            sum_over(&mut query, "=sum(1)"),
            Err(FormulaError::Eval(EvalError::InvalidType))
        );
        assert_eq!(
            sum_over(&mut query, "=sum(A1..A2, A3..A4)"),
            Err(FormulaError::Eval(EvalError::InvalidArguments))
        );
        assert_eq!(
            sum_over(&mut query, "=sum()"),
            Err(FormulaError::Eval(EvalError::InvalidArguments))
        );
    }

    #[test]
    fn test_sum_outside_grid() {
        let mut query = MapQuery::new("C1");
        assert_eq!(
            sum_over(&mut query, "=sum(A39..A41)"),
            Err(FormulaError::Eval(EvalError::InvalidCell))
        );
    }
}
