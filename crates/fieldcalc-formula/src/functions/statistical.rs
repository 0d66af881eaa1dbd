//! Counting functions

use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};
use rust_decimal::Decimal;

/// COUNTA function: counts values that are neither blank nor empty text
pub fn fn_counta(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let count = args
        .iter()
        .filter(|arg| match arg {
            FormulaValue::Blank => false,
            FormulaValue::String(s) => !s.is_empty(),
            _ => true,
        })
        .count();

    Ok(FormulaValue::Number(Decimal::from(count)))
}
