//! Formula evaluator
//!
//! Evaluates formula ASTs against one record to produce values.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::{date, registry};
use crate::options::DateArithmetic;
use crate::parser::check_arity;
use chrono::{NaiveDate, NaiveDateTime};
use fieldcalc_core::{format_date, FieldCatalog, FieldValue, RecordSnapshot};
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Value types during formula evaluation
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FormulaValue {
    #[default]
    Blank,
    Number(Decimal),
    String(String),
    Boolean(bool),
    Date(NaiveDateTime),
}

impl FormulaValue {
    /// Convert to number, if possible
    ///
    /// Blank is zero, booleans are 1/0 and numeric text is parsed.
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            FormulaValue::Boolean(true) => Some(Decimal::ONE),
            FormulaValue::Boolean(false) => Some(Decimal::ZERO),
            FormulaValue::String(s) => parse_number_text(s),
            FormulaValue::Blank => Some(Decimal::ZERO),
            FormulaValue::Date(_) => None,
        }
    }

    /// Convert to boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FormulaValue::Boolean(b) => Some(*b),
            FormulaValue::Number(n) => Some(!n.is_zero()),
            FormulaValue::Blank => Some(false),
            FormulaValue::String(s) => {
                let s = s.trim();
                if s.is_empty() || s.eq_ignore_ascii_case("FALSE") {
                    Some(false)
                } else if s.eq_ignore_ascii_case("TRUE") {
                    Some(true)
                } else {
                    parse_number_text(s).map(|n| !n.is_zero())
                }
            }
            FormulaValue::Date(_) => None,
        }
    }

    /// Convert to display string
    pub fn as_string(&self) -> String {
        match self {
            FormulaValue::Number(n) => n.normalize().to_string(),
            FormulaValue::String(s) => s.clone(),
            FormulaValue::Boolean(true) => "TRUE".to_string(),
            FormulaValue::Boolean(false) => "FALSE".to_string(),
            FormulaValue::Date(d) => format_date(d),
            FormulaValue::Blank => String::new(),
        }
    }

    /// Convert to date, if possible
    ///
    /// Text in ISO form (`YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` or with a space
    /// separator) is accepted.
    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            FormulaValue::Date(d) => Some(*d),
            FormulaValue::String(s) => parse_date_text(s),
            _ => None,
        }
    }

    /// Check if this is blank
    pub fn is_blank(&self) -> bool {
        matches!(self, FormulaValue::Blank)
    }

    /// Get the type name
    pub fn type_name(&self) -> &'static str {
        match self {
            FormulaValue::Blank => "blank",
            FormulaValue::Number(_) => "number",
            FormulaValue::String(_) => "text",
            FormulaValue::Boolean(_) => "boolean",
            FormulaValue::Date(_) => "date",
        }
    }
}

fn parse_number_text(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn parse_date_text(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

impl fmt::Display for FormulaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl From<FieldValue> for FormulaValue {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Blank => FormulaValue::Blank,
            FieldValue::Number(n) => FormulaValue::Number(n),
            FieldValue::Text(s) => FormulaValue::String(s),
            FieldValue::Boolean(b) => FormulaValue::Boolean(b),
            FieldValue::Date(d) => FormulaValue::Date(d),
        }
    }
}

impl From<&FieldValue> for FormulaValue {
    fn from(value: &FieldValue) -> Self {
        value.clone().into()
    }
}

impl From<FormulaValue> for FieldValue {
    fn from(value: FormulaValue) -> Self {
        match value {
            FormulaValue::Blank => FieldValue::Blank,
            FormulaValue::Number(n) => FieldValue::Number(n),
            FormulaValue::String(s) => FieldValue::Text(s),
            FormulaValue::Boolean(b) => FieldValue::Boolean(b),
            FormulaValue::Date(d) => FieldValue::Date(d),
        }
    }
}

impl From<Decimal> for FormulaValue {
    fn from(n: Decimal) -> Self {
        FormulaValue::Number(n)
    }
}

impl From<i32> for FormulaValue {
    fn from(n: i32) -> Self {
        FormulaValue::Number(Decimal::from(n))
    }
}

impl From<i64> for FormulaValue {
    fn from(n: i64) -> Self {
        FormulaValue::Number(Decimal::from(n))
    }
}

impl From<bool> for FormulaValue {
    fn from(b: bool) -> Self {
        FormulaValue::Boolean(b)
    }
}

impl From<&str> for FormulaValue {
    fn from(s: &str) -> Self {
        FormulaValue::String(s.to_string())
    }
}

impl From<String> for FormulaValue {
    fn from(s: String) -> Self {
        FormulaValue::String(s)
    }
}

/// Context for formula evaluation
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluationContext<'a> {
    /// Field catalog used to resolve `{Display Name}` references
    pub catalog: Option<&'a FieldCatalog>,
    /// Stored values of the record being evaluated
    pub record: Option<&'a RecordSnapshot>,
    /// Month/year arithmetic for DATEADD and DATEDIF
    pub date_arithmetic: DateArithmetic,
    /// Fixed clock for TODAY()/NOW(); the local clock when unset
    pub clock: Option<NaiveDateTime>,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context
    pub fn new(catalog: &'a FieldCatalog, record: &'a RecordSnapshot) -> Self {
        Self {
            catalog: Some(catalog),
            record: Some(record),
            date_arithmetic: DateArithmetic::default(),
            clock: None,
        }
    }

    /// Create a context with no fields (every reference is blank)
    pub fn simple() -> Self {
        Self::default()
    }

    /// Pin the clock read by TODAY() and NOW()
    pub fn with_clock(mut self, now: NaiveDateTime) -> Self {
        self.clock = Some(now);
        self
    }

    /// Set the month/year arithmetic mode
    pub fn with_date_arithmetic(mut self, mode: DateArithmetic) -> Self {
        self.date_arithmetic = mode;
        self
    }

    /// Current date and time
    pub fn now(&self) -> NaiveDateTime {
        self.clock
            .unwrap_or_else(|| chrono::Local::now().naive_local())
    }

    /// Resolve a field reference by display name
    ///
    /// Unknown names and fields without a stored value are blank.
    pub fn field_value(&self, name: &str) -> FormulaValue {
        let Some(id) = self.catalog.and_then(|c| c.resolve(name)) else {
            tracing::trace!(field = name, "reference to unknown field");
            return FormulaValue::Blank;
        };

        self.record
            .and_then(|r| r.get(id))
            .map(FormulaValue::from)
            .unwrap_or(FormulaValue::Blank)
    }
}

/// Evaluate a formula expression
pub fn evaluate(expr: &FormulaExpr, ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match expr {
        FormulaExpr::Literal(value) => Ok(value.clone()),

        FormulaExpr::FieldRef(name) => Ok(ctx.field_value(name)),

        FormulaExpr::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right, ctx),

        FormulaExpr::UnaryOp { op, operand } => evaluate_unary_op(*op, operand, ctx),

        FormulaExpr::Call { name, args } => evaluate_function(name, args, ctx),
    }
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &FormulaExpr,
    right: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let left_val = evaluate(left, ctx)?;
    let right_val = evaluate(right, ctx)?;
    apply_binary_op(op, &left_val, &right_val)
}

/// Apply a binary operator to two evaluated operands
pub fn apply_binary_op(
    op: BinaryOperator,
    left: &FormulaValue,
    right: &FormulaValue,
) -> FormulaResult<FormulaValue> {
    match op {
        BinaryOperator::Add
        | BinaryOperator::Subtract
        | BinaryOperator::Multiply
        | BinaryOperator::Divide
        | BinaryOperator::Modulo
        | BinaryOperator::Power => arithmetic(op, left, right),

        BinaryOperator::Equal => Ok(FormulaValue::Boolean(
            compare_values(left, right) == Ordering::Equal,
        )),
        BinaryOperator::NotEqual => Ok(FormulaValue::Boolean(
            compare_values(left, right) != Ordering::Equal,
        )),
        BinaryOperator::LessThan => Ok(FormulaValue::Boolean(
            compare_values(left, right) == Ordering::Less,
        )),
        BinaryOperator::LessEqual => Ok(FormulaValue::Boolean(
            compare_values(left, right) != Ordering::Greater,
        )),
        BinaryOperator::GreaterThan => Ok(FormulaValue::Boolean(
            compare_values(left, right) == Ordering::Greater,
        )),
        BinaryOperator::GreaterEqual => Ok(FormulaValue::Boolean(
            compare_values(left, right) != Ordering::Less,
        )),

        BinaryOperator::Concat => Ok(FormulaValue::String(left.as_string() + &right.as_string())),
    }
}

fn arithmetic(
    op: BinaryOperator,
    left: &FormulaValue,
    right: &FormulaValue,
) -> FormulaResult<FormulaValue> {
    if left.is_blank() && right.is_blank() {
        return Ok(FormulaValue::Blank);
    }

    // Date arithmetic: shift by days or measure the gap between two dates
    match (op, left, right) {
        (BinaryOperator::Subtract, FormulaValue::Date(a), FormulaValue::Date(b)) => {
            return Ok(FormulaValue::Number(date::days_between(b, a)));
        }
        (BinaryOperator::Add, FormulaValue::Date(d), other)
        | (BinaryOperator::Add, other, FormulaValue::Date(d)) => {
            let days = operand(op, other)?;
            return date::shift_days(d, days).map(FormulaValue::Date);
        }
        (BinaryOperator::Subtract, FormulaValue::Date(d), other) => {
            let days = operand(op, other)?;
            return date::shift_days(d, -days).map(FormulaValue::Date);
        }
        _ => {}
    }

    let l = operand(op, left)?;
    let r = operand(op, right)?;

    let result = match op {
        BinaryOperator::Add => l.checked_add(r),
        BinaryOperator::Subtract => l.checked_sub(r),
        BinaryOperator::Multiply => l.checked_mul(r),
        BinaryOperator::Divide => {
            if r.is_zero() {
                return Err(FormulaError::DivisionByZero);
            }
            l.checked_div(r)
        }
        BinaryOperator::Modulo => {
            if r.is_zero() {
                return Err(FormulaError::DivisionByZero);
            }
            l.checked_rem(r)
        }
        BinaryOperator::Power => return power(l, r).map(FormulaValue::Number),
        _ => None,
    };

    result
        .map(FormulaValue::Number)
        .ok_or_else(|| FormulaError::Evaluation(format!("Numeric overflow in '{}'", op)))
}

fn operand(op: BinaryOperator, value: &FormulaValue) -> FormulaResult<Decimal> {
    value.as_number().ok_or_else(|| FormulaError::TypeMismatch {
        operator: op.symbol().to_string(),
        value: describe(value),
    })
}

fn describe(value: &FormulaValue) -> String {
    match value {
        FormulaValue::String(s) => format!("text \"{}\"", s),
        other => format!("{} {}", other.type_name(), other),
    }
}

/// Decimal places kept from a fractional power
const FRACTIONAL_POWER_DP: u32 = 20;

/// Raise `base` to `exponent`
///
/// Integer exponents are exact. Fractional exponents are rounded to
/// [`FRACTIONAL_POWER_DP`] decimal places.
pub(crate) fn power(base: Decimal, exponent: Decimal) -> FormulaResult<Decimal> {
    use rust_decimal::prelude::ToPrimitive;

    let overflow = || FormulaError::Evaluation("Numeric overflow in '^'".into());

    if exponent.fract().is_zero() {
        let exp = exponent.to_i64().ok_or_else(overflow)?;
        if base.is_zero() && exp < 0 {
            return Err(FormulaError::DivisionByZero);
        }
        return base.checked_powi(exp).ok_or_else(overflow);
    }

    if base.is_sign_negative() && !base.is_zero() {
        return Err(FormulaError::Argument(
            "Cannot raise a negative number to a fractional power".into(),
        ));
    }
    if base.is_zero() {
        if exponent.is_sign_negative() {
            return Err(FormulaError::DivisionByZero);
        }
        return Ok(Decimal::ZERO);
    }

    // Half powers go through sqrt so perfect squares stay exact
    let doubled = exponent.checked_mul(Decimal::TWO).ok_or_else(overflow)?;
    let raw = if doubled.fract().is_zero() {
        let exp = doubled.to_i64().ok_or_else(overflow)?;
        base.sqrt()
            .and_then(|root| root.checked_powi(exp))
            .ok_or_else(overflow)?
    } else {
        base.checked_powd(exponent).ok_or_else(overflow)?
    };

    Ok(raw
        .round_dp_with_strategy(FRACTIONAL_POWER_DP, RoundingStrategy::MidpointAwayFromZero)
        .normalize())
}

/// Compare two values for ordering
///
/// Blank compares as 0 against numbers, "" against text and FALSE against
/// booleans. Text compares case-insensitively. Mixed types order
/// number < date < text < boolean, except that ISO date text compares as a
/// date against a date.
pub fn compare_values(left: &FormulaValue, right: &FormulaValue) -> Ordering {
    use FormulaValue::*;

    match (left, right) {
        (Blank, Blank) => Ordering::Equal,
        (Blank, Number(r)) => Decimal::ZERO.cmp(r),
        (Number(l), Blank) => l.cmp(&Decimal::ZERO),
        (Blank, String(r)) => "".cmp(r.as_str()),
        (String(l), Blank) => l.as_str().cmp(""),
        (Blank, Boolean(r)) => false.cmp(r),
        (Boolean(l), Blank) => l.cmp(&false),
        (Blank, Date(_)) => Ordering::Less,
        (Date(_), Blank) => Ordering::Greater,

        (Number(l), Number(r)) => l.cmp(r),
        (String(l), String(r)) => l.to_lowercase().cmp(&r.to_lowercase()),
        (Boolean(l), Boolean(r)) => l.cmp(r),
        (Date(l), Date(r)) => l.cmp(r),

        (Date(l), String(s)) => match parse_date_text(s) {
            Some(r) => l.cmp(&r),
            None => Ordering::Less,
        },
        (String(s), Date(r)) => match parse_date_text(s) {
            Some(l) => l.cmp(r),
            None => Ordering::Greater,
        },

        _ => type_rank(left).cmp(&type_rank(right)),
    }
}

fn type_rank(value: &FormulaValue) -> u8 {
    match value {
        FormulaValue::Blank => 0,
        FormulaValue::Number(_) => 1,
        FormulaValue::Date(_) => 2,
        FormulaValue::String(_) => 3,
        FormulaValue::Boolean(_) => 4,
    }
}

/// Evaluate a unary operation
fn evaluate_unary_op(
    op: UnaryOperator,
    operand: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let val = evaluate(operand, ctx)?;

    match op {
        UnaryOperator::Negate => {
            if val.is_blank() {
                return Ok(FormulaValue::Blank);
            }
            let n = val.as_number().ok_or_else(|| FormulaError::TypeMismatch {
                operator: "-".into(),
                value: describe(&val),
            })?;
            Ok(FormulaValue::Number(-n))
        }
    }
}

/// Evaluate a function call
fn evaluate_function(
    name: &str,
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let func = registry()
        .get(name)
        .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

    // Trees built by hand skip the parser's check
    check_arity(func.name, args.len())?;

    // Evaluate arguments eagerly, left to right
    let mut evaluated_args = Vec::with_capacity(args.len());
    for arg in args {
        evaluated_args.push(evaluate(arg, ctx)?);
    }

    (func.implementation)(&evaluated_args, ctx)
}
