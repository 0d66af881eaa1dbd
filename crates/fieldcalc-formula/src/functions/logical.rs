//! Logical functions

use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{EvaluationContext, FormulaValue};

fn logical_arg(value: &FormulaValue, function: &str) -> FormulaResult<bool> {
    value.as_bool().ok_or_else(|| {
        FormulaError::Argument(format!(
            "{} expects a logical value, got {} \"{}\"",
            function,
            value.type_name(),
            value
        ))
    })
}

/// IF function
///
/// All arguments are evaluated before the branch is chosen.
pub fn fn_if(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let condition = args.first().unwrap_or(&FormulaValue::Blank);
    let if_true = args.get(1).cloned().unwrap_or_default();
    let if_false = args.get(2).cloned().unwrap_or(FormulaValue::Boolean(false));

    if logical_arg(condition, "IF")? {
        Ok(if_true)
    } else {
        Ok(if_false)
    }
}

/// AND function
pub fn fn_and(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut result = true;
    for arg in args {
        result &= logical_arg(arg, "AND")?;
    }
    Ok(FormulaValue::Boolean(result))
}

/// OR function
pub fn fn_or(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut result = false;
    for arg in args {
        result |= logical_arg(arg, "OR")?;
    }
    Ok(FormulaValue::Boolean(result))
}

/// NOT function
pub fn fn_not(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let value = args.first().unwrap_or(&FormulaValue::Blank);
    Ok(FormulaValue::Boolean(!logical_arg(value, "NOT")?))
}
