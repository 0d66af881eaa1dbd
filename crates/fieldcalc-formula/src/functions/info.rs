//! Special and information functions

use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{EvaluationContext, FormulaValue};

/// BLANK()
pub fn fn_blank(_args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Blank)
}

/// ERROR([message]): fails the evaluation with the given message
pub fn fn_error(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let message = match args.first() {
        Some(v) if !v.is_blank() => v.as_string(),
        _ => "Error".to_string(),
    };
    Err(FormulaError::Explicit(message))
}

/// ISBLANK(value)
pub fn fn_isblank(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(matches!(
        args.first(),
        None | Some(FormulaValue::Blank)
    )))
}

/// ISNUMBER(value): true for numbers only, not numeric text
pub fn fn_isnumber(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(matches!(
        args.first(),
        Some(FormulaValue::Number(_))
    )))
}

/// ISTEXT(value)
pub fn fn_istext(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Boolean(matches!(
        args.first(),
        Some(FormulaValue::String(_))
    )))
}

#[cfg(test)]
mod tests {
    use crate::error::FormulaError;
    use crate::evaluator::{evaluate, EvaluationContext, FormulaValue};
    use crate::parser::parse_formula;

    fn eval(formula: &str) -> Result<FormulaValue, FormulaError> {
        evaluate(&parse_formula(formula)?, &EvaluationContext::simple())
    }

    #[test]
    fn test_error() {
        assert_eq!(eval("ERROR()"), Err(FormulaError::Explicit("Error".into())));
        assert_eq!(
            eval("ERROR(\"Out of stock\")"),
            Err(FormulaError::Explicit("Out of stock".into()))
        );
    }

    #[test]
    fn test_type_checks() {
        assert_eq!(eval("ISBLANK(BLANK())").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("ISBLANK(\"\")").unwrap(), FormulaValue::Boolean(false));
        assert_eq!(eval("ISNUMBER(1.5)").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("ISNUMBER(\"1.5\")").unwrap(), FormulaValue::Boolean(false));
        assert_eq!(eval("ISTEXT(\"a\")").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("ISTEXT(TRUE)").unwrap(), FormulaValue::Boolean(false));
    }
}
