//! Date/time functions
//!
//! Dates are `NaiveDateTime` values; ISO date text is accepted wherever a
//! date argument is expected. Month and year steps in DATEADD and DATEDIF
//! follow the context's [`DateArithmetic`] mode: in the approximate mode a
//! month is 30 days and a year is 365 days.

use super::{number_arg, text_arg};
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{EvaluationContext, FormulaValue};
use crate::options::DateArithmetic;
use chrono::{Datelike, Months, NaiveDateTime, NaiveTime, TimeDelta};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateUnit {
    Days,
    Weeks,
    Months,
    Years,
}

impl DateUnit {
    fn parse(text: &str, function: &str) -> FormulaResult<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "d" | "day" | "days" => Ok(DateUnit::Days),
            "w" | "week" | "weeks" => Ok(DateUnit::Weeks),
            "m" | "month" | "months" => Ok(DateUnit::Months),
            "y" | "year" | "years" => Ok(DateUnit::Years),
            other => Err(FormulaError::Argument(format!(
                "{} unit must be days, weeks, months or years, got \"{}\"",
                function, other
            ))),
        }
    }

    /// Length in days under the approximate arithmetic
    fn approximate_days(self) -> i64 {
        match self {
            DateUnit::Days => 1,
            DateUnit::Weeks => 7,
            DateUnit::Months => 30,
            DateUnit::Years => 365,
        }
    }
}

fn out_of_range() -> FormulaError {
    FormulaError::Evaluation("Date out of range".into())
}

/// Shift a date by a (possibly fractional) number of days
pub(crate) fn shift_days(date: &NaiveDateTime, days: Decimal) -> FormulaResult<NaiveDateTime> {
    let seconds = days
        .checked_mul(Decimal::from(SECONDS_PER_DAY))
        .and_then(|s| s.round().to_i64())
        .ok_or_else(out_of_range)?;
    let delta = TimeDelta::try_seconds(seconds).ok_or_else(out_of_range)?;
    date.checked_add_signed(delta).ok_or_else(out_of_range)
}

/// Days from `start` to `end`, fractional when the times differ
pub(crate) fn days_between(start: &NaiveDateTime, end: &NaiveDateTime) -> Decimal {
    let seconds = (*end - *start).num_seconds();
    (Decimal::from(seconds) / Decimal::from(SECONDS_PER_DAY)).normalize()
}

fn date_arg(args: &[FormulaValue], index: usize, function: &str) -> FormulaResult<NaiveDateTime> {
    let value = args.get(index).unwrap_or(&FormulaValue::Blank);
    value.as_date().ok_or_else(|| {
        FormulaError::Argument(format!(
            "{} expects a date for argument {}, got {}",
            function,
            index + 1,
            value.type_name()
        ))
    })
}

fn whole(n: i64) -> FormulaValue {
    FormulaValue::Number(Decimal::from(n))
}

/// TODAY(): current date at midnight
pub fn fn_today(_args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Date(ctx.now().date().and_time(NaiveTime::MIN)))
}

/// NOW(): current date and time
pub fn fn_now(_args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(FormulaValue::Date(ctx.now()))
}

/// YEAR(date)
pub fn fn_year(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(whole(date_arg(args, 0, "YEAR")?.year().into()))
}

/// MONTH(date)
pub fn fn_month(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(whole(date_arg(args, 0, "MONTH")?.month().into()))
}

/// DAY(date)
pub fn fn_day(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(whole(date_arg(args, 0, "DAY")?.day().into()))
}

/// DATEADD(date, amount, unit)
pub fn fn_dateadd(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let date = date_arg(args, 0, "DATEADD")?;
    let amount = number_arg(args, 1, "DATEADD")?;
    let unit = DateUnit::parse(&text_arg(args, 2), "DATEADD")?;

    let shifted = match (unit, ctx.date_arithmetic) {
        (DateUnit::Months | DateUnit::Years, DateArithmetic::Calendar) => {
            let per_unit = if unit == DateUnit::Years { 12 } else { 1 };
            let months = amount
                .trunc()
                .to_i64()
                .and_then(|n| n.checked_mul(per_unit))
                .ok_or_else(out_of_range)?;
            add_calendar_months(&date, months)?
        }
        _ => {
            let days = amount
                .checked_mul(Decimal::from(unit.approximate_days()))
                .ok_or_else(out_of_range)?;
            shift_days(&date, days)?
        }
    };

    Ok(FormulaValue::Date(shifted))
}

fn add_calendar_months(date: &NaiveDateTime, months: i64) -> FormulaResult<NaiveDateTime> {
    let magnitude = u32::try_from(months.unsigned_abs()).map_err(|_| out_of_range())?;
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(magnitude))
    } else {
        date.checked_sub_months(Months::new(magnitude))
    };
    shifted.ok_or_else(out_of_range)
}

/// DATEDIF(start, end, unit): whole units from start to end
///
/// Negative when end is before start.
pub fn fn_datedif(args: &[FormulaValue], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let start = date_arg(args, 0, "DATEDIF")?;
    let end = date_arg(args, 1, "DATEDIF")?;
    let unit = DateUnit::parse(&text_arg(args, 2), "DATEDIF")?;

    let count = match (unit, ctx.date_arithmetic) {
        (DateUnit::Months, DateArithmetic::Calendar) => calendar_months_between(&start, &end),
        (DateUnit::Years, DateArithmetic::Calendar) => calendar_months_between(&start, &end) / 12,
        _ => (end - start).num_seconds() / (SECONDS_PER_DAY * unit.approximate_days()),
    };

    Ok(whole(count))
}

/// Complete calendar months from `start` to `end`
fn calendar_months_between(start: &NaiveDateTime, end: &NaiveDateTime) -> i64 {
    if end < start {
        return -calendar_months_between(end, start);
    }

    let mut months = i64::from(end.year() - start.year()) * 12 + i64::from(end.month())
        - i64::from(start.month());

    // The last month is incomplete if end falls earlier in its month
    if (end.day(), end.time()) < (start.day(), start.time()) {
        months -= 1;
    }

    months
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::evaluate;
    use crate::parser::parse_formula;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn eval_with(formula: &str, ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
        evaluate(&parse_formula(formula)?, ctx)
    }

    fn eval(formula: &str) -> FormulaResult<FormulaValue> {
        eval_with(formula, &EvaluationContext::simple())
    }

    #[test]
    fn test_today_and_now_use_the_clock() {
        let now = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        let ctx = EvaluationContext::simple().with_clock(now);

        assert_eq!(eval_with("NOW()", &ctx).unwrap(), FormulaValue::Date(now));
        assert_eq!(
            eval_with("TODAY()", &ctx).unwrap(),
            FormulaValue::Date(at(2024, 6, 1))
        );
        assert_eq!(eval_with("YEAR(TODAY())", &ctx).unwrap(), FormulaValue::from(2024));
    }

    #[test]
    fn test_year_month_day() {
        assert_eq!(eval("YEAR(\"2023-11-05\")").unwrap(), FormulaValue::from(2023));
        assert_eq!(eval("MONTH(\"2023-11-05\")").unwrap(), FormulaValue::from(11));
        assert_eq!(eval("DAY(\"2023-11-05T08:00:00\")").unwrap(), FormulaValue::from(5));
        assert!(matches!(eval("YEAR(\"soon\")"), Err(FormulaError::Argument(_))));
        assert!(matches!(eval("YEAR(42)"), Err(FormulaError::Argument(_))));
    }

    #[test]
    fn test_dateadd_approximate() {
        assert_eq!(
            eval("DATEADD(\"2024-01-31\", 1, \"months\")").unwrap(),
            FormulaValue::Date(at(2024, 3, 1))
        );
        assert_eq!(
            eval("DATEADD(\"2024-01-01\", 2, \"weeks\")").unwrap(),
            FormulaValue::Date(at(2024, 1, 15))
        );
        assert_eq!(
            eval("DATEADD(\"2023-01-01\", 1, \"year\")").unwrap(),
            FormulaValue::Date(at(2024, 1, 1))
        );
        assert_eq!(
            eval("DATEADD(\"2024-01-10\", -3, \"days\")").unwrap(),
            FormulaValue::Date(at(2024, 1, 7))
        );
        assert!(matches!(
            eval("DATEADD(\"2024-01-10\", 1, \"fortnights\")"),
            Err(FormulaError::Argument(_))
        ));
    }

    #[test]
    fn test_dateadd_calendar() {
        let ctx = EvaluationContext::simple().with_date_arithmetic(DateArithmetic::Calendar);
        assert_eq!(
            eval_with("DATEADD(\"2024-01-31\", 1, \"months\")", &ctx).unwrap(),
            FormulaValue::Date(at(2024, 2, 29))
        );
        assert_eq!(
            eval_with("DATEADD(\"2024-02-29\", 1, \"years\")", &ctx).unwrap(),
            FormulaValue::Date(at(2025, 2, 28))
        );
        assert_eq!(
            eval_with("DATEADD(\"2024-03-31\", -1, \"months\")", &ctx).unwrap(),
            FormulaValue::Date(at(2024, 2, 29))
        );
    }

    #[test]
    fn test_datedif() {
        assert_eq!(
            eval("DATEDIF(\"2024-01-01\", \"2024-03-01\", \"days\")").unwrap(),
            FormulaValue::from(60)
        );
        assert_eq!(
            eval("DATEDIF(\"2024-01-01\", \"2024-03-01\", \"months\")").unwrap(),
            FormulaValue::from(2)
        );
        assert_eq!(
            eval("DATEDIF(\"2024-03-01\", \"2024-01-01\", \"weeks\")").unwrap(),
            FormulaValue::from(-8)
        );

        let ctx = EvaluationContext::simple().with_date_arithmetic(DateArithmetic::Calendar);
        assert_eq!(
            eval_with("DATEDIF(\"2024-01-31\", \"2024-02-29\", \"months\")", &ctx).unwrap(),
            FormulaValue::from(0)
        );
        assert_eq!(
            eval_with("DATEDIF(\"2020-02-29\", \"2024-02-29\", \"years\")", &ctx).unwrap(),
            FormulaValue::from(4)
        );
        assert_eq!(
            eval_with("DATEDIF(\"2024-05-15\", \"2024-01-20\", \"months\")", &ctx).unwrap(),
            FormulaValue::from(-3)
        );
    }

    #[test]
    fn test_shift_and_difference() {
        let d = at(2024, 1, 1);
        assert_eq!(
            shift_days(&d, Decimal::new(5, 1)).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap()
        );
        assert_eq!(days_between(&d, &at(2024, 1, 11)), Decimal::from(10));
        assert!(shift_days(&d, Decimal::MAX).is_err());
    }
}
