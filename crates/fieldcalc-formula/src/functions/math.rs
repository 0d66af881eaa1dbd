//! Math and aggregation functions

use super::{number_arg, optional_number_arg};
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{power, EvaluationContext, FormulaValue};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};

/// Numeric view of aggregation arguments
///
/// Blanks, dates and non-numeric text are skipped.
pub(crate) fn numeric_values(args: &[FormulaValue]) -> impl Iterator<Item = Decimal> + '_ {
    args.iter().filter_map(|arg| match arg {
        FormulaValue::Blank | FormulaValue::Date(_) => None,
        other => other.as_number(),
    })
}

/// Largest scale a `Decimal` can carry
const MAX_SCALE: u32 = 28;

fn overflow(function: &str) -> FormulaError {
    FormulaError::Evaluation(format!("Numeric overflow in {}", function))
}

/// SUM function
pub fn fn_sum(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut sum = Decimal::ZERO;
    for n in numeric_values(args) {
        sum = sum.checked_add(n).ok_or_else(|| overflow("SUM"))?;
    }
    Ok(FormulaValue::Number(sum))
}

/// AVERAGE function
pub fn fn_average(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut sum = Decimal::ZERO;
    let mut count = 0u32;

    for n in numeric_values(args) {
        sum = sum.checked_add(n).ok_or_else(|| overflow("AVERAGE"))?;
        count += 1;
    }

    if count == 0 {
        return Err(FormulaError::DivisionByZero);
    }

    sum.checked_div(Decimal::from(count))
        .map(FormulaValue::Number)
        .ok_or_else(|| overflow("AVERAGE"))
}

/// MIN function (0 when there are no numbers)
pub fn fn_min(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let min = numeric_values(args).min().unwrap_or(Decimal::ZERO);
    Ok(FormulaValue::Number(min))
}

/// MAX function (0 when there are no numbers)
pub fn fn_max(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let max = numeric_values(args).max().unwrap_or(Decimal::ZERO);
    Ok(FormulaValue::Number(max))
}

/// COUNT function
pub fn fn_count(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let count = numeric_values(args).count();
    Ok(FormulaValue::Number(Decimal::from(count)))
}

/// ROUND function
///
/// Rounds half away from zero. Negative digits round to the left of the
/// decimal point, so `ROUND(1250, -2)` is 1300.
pub fn fn_round(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let number = number_arg(args, 0, "ROUND")?;
    // Digit counts past the decimal scale limit behave like the limit
    let limit = Decimal::from(MAX_SCALE);
    let digits = optional_number_arg(args, 1, "ROUND")?
        .map(|d| {
            d.trunc()
                .clamp(-limit, limit)
                .to_i64()
                .unwrap_or(0)
        })
        .unwrap_or(0);

    round_half_away(number, digits).map(FormulaValue::Number)
}

fn round_half_away(number: Decimal, digits: i64) -> FormulaResult<Decimal> {
    if digits >= 0 {
        let dp = u32::try_from(digits).unwrap_or(u32::MAX);
        return Ok(number.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero));
    }

    // Beyond the representable range everything rounds to zero
    let Some(factor) = digits
        .checked_neg()
        .and_then(|exp| Decimal::TEN.checked_powi(exp))
    else {
        return Ok(Decimal::ZERO);
    };
    let scaled = number / factor;
    scaled
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(factor)
        .ok_or_else(|| overflow("ROUND"))
}

fn significance(args: &[FormulaValue], function: &str) -> FormulaResult<Decimal> {
    Ok(optional_number_arg(args, 1, function)?.unwrap_or(Decimal::ONE))
}

/// FLOOR function: round down to a multiple of significance (default 1)
pub fn fn_floor(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let number = number_arg(args, 0, "FLOOR")?;
    let sig = significance(args, "FLOOR")?;
    if sig.is_zero() {
        return Ok(FormulaValue::Number(Decimal::ZERO));
    }

    number
        .checked_div(sig)
        .and_then(|q| q.floor().checked_mul(sig))
        .map(FormulaValue::Number)
        .ok_or_else(|| overflow("FLOOR"))
}

/// CEILING function: round up to a multiple of significance (default 1)
pub fn fn_ceiling(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let number = number_arg(args, 0, "CEILING")?;
    let sig = significance(args, "CEILING")?;
    if sig.is_zero() {
        return Ok(FormulaValue::Number(Decimal::ZERO));
    }

    number
        .checked_div(sig)
        .and_then(|q| q.ceil().checked_mul(sig))
        .map(FormulaValue::Number)
        .ok_or_else(|| overflow("CEILING"))
}

/// ABS function
pub fn fn_abs(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Number(number_arg(args, 0, "ABS")?.abs()))
}

/// POWER function
pub fn fn_power(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let base = number_arg(args, 0, "POWER")?;
    let exponent = number_arg(args, 1, "POWER")?;
    power(base, exponent).map(FormulaValue::Number)
}

/// SQRT function
pub fn fn_sqrt(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let number = number_arg(args, 0, "SQRT")?;
    if number.is_sign_negative() && !number.is_zero() {
        return Err(FormulaError::Argument("SQRT of a negative number".into()));
    }

    number
        .sqrt()
        .map(FormulaValue::Number)
        .ok_or_else(|| overflow("SQRT"))
}
