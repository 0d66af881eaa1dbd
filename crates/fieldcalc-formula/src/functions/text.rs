//! Text functions
//!
//! Positions and counts are in characters, and positions are 1-indexed.

use super::{count_arg, text_arg};
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{EvaluationContext, FormulaValue};
use rust_decimal::Decimal;

fn take_left(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn take_right(s: &str, n: usize) -> String {
    let len = s.chars().count();
    if n >= len {
        return s.to_string();
    }
    s.chars().skip(len - n).collect()
}

fn optional_count(args: &[FormulaValue], index: usize, function: &str) -> FormulaResult<usize> {
    if args.get(index).is_some() {
        count_arg(args, index, function)
    } else {
        Ok(1)
    }
}

/// CONCAT(value, ...) and CONCATENATE(value, ...)
pub fn fn_concat(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let joined: String = args.iter().map(FormulaValue::as_string).collect();
    Ok(FormulaValue::String(joined))
}

/// LEN(text)
pub fn fn_len(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let len = text_arg(args, 0).chars().count();
    Ok(FormulaValue::Number(Decimal::from(len)))
}

/// LEFT(text, [num_chars])
pub fn fn_left(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let text = text_arg(args, 0);
    let n = optional_count(args, 1, "LEFT")?;
    Ok(FormulaValue::String(take_left(&text, n)))
}

/// RIGHT(text, [num_chars])
pub fn fn_right(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let text = text_arg(args, 0);
    let n = optional_count(args, 1, "RIGHT")?;
    Ok(FormulaValue::String(take_right(&text, n)))
}

/// MID(text, start, num_chars)
pub fn fn_mid(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let text = text_arg(args, 0);
    let start = count_arg(args, 1, "MID")?;
    let n = count_arg(args, 2, "MID")?;

    if start == 0 {
        return Err(FormulaError::Argument("MID start position must be at least 1".into()));
    }

    let mid: String = text.chars().skip(start - 1).take(n).collect();
    Ok(FormulaValue::String(mid))
}

/// LOWER(text)
pub fn fn_lower(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::String(text_arg(args, 0).to_lowercase()))
}

/// UPPER(text)
pub fn fn_upper(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::String(text_arg(args, 0).to_uppercase()))
}

/// TRIM(text): strip leading and trailing whitespace
pub fn fn_trim(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::String(text_arg(args, 0).trim().to_string()))
}

/// SUBSTITUTE(text, old_text, new_text, [instance_num])
///
/// Without an instance number every occurrence is replaced.
pub fn fn_substitute(
    args: &[FormulaValue],
    _ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let text = text_arg(args, 0);
    let old_text = text_arg(args, 1);
    let new_text = text_arg(args, 2);

    let instance = match args.get(3) {
        None | Some(FormulaValue::Blank) => None,
        Some(_) => {
            let n = count_arg(args, 3, "SUBSTITUTE")?;
            if n == 0 {
                return Err(FormulaError::Argument(
                    "SUBSTITUTE instance number must be at least 1".into(),
                ));
            }
            Some(n)
        }
    };

    if old_text.is_empty() {
        return Ok(FormulaValue::String(text));
    }

    let Some(n) = instance else {
        return Ok(FormulaValue::String(text.replace(&old_text, &new_text)));
    };

    // Replace only the nth occurrence
    match text.match_indices(&old_text).nth(n - 1) {
        Some((pos, _)) => {
            let mut result = String::with_capacity(text.len() + new_text.len());
            result.push_str(&text[..pos]);
            result.push_str(&new_text);
            result.push_str(&text[pos + old_text.len()..]);
            Ok(FormulaValue::String(result))
        }
        None => Ok(FormulaValue::String(text)),
    }
}
