//! Built-in formula functions

pub mod date;
pub mod info;
pub mod logical;
pub mod math;
pub mod statistical;
pub mod text;

use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{EvaluationContext, FormulaValue};
use ahash::AHashMap;
use std::sync::OnceLock;

/// Function implementation signature
///
/// Functions receive their already-evaluated arguments and may consult the
/// evaluation context for the clock and the date arithmetic mode.
pub type FunctionImpl = fn(&[FormulaValue], &EvaluationContext) -> FormulaResult<FormulaValue>;

/// Function definition
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
    /// Result depends on the clock rather than only on the arguments
    pub volatile: bool,
}

impl FunctionDef {
    /// Human readable arity, e.g. `1`, `2 to 3`, `at least 1`
    pub fn arity_description(&self) -> String {
        match self.max_args {
            Some(max) if max == self.min_args => max.to_string(),
            Some(max) => format!("{} to {}", self.min_args, max),
            None => format!("at least {}", self.min_args),
        }
    }
}

/// Function registry
pub struct FunctionRegistry {
    functions: AHashMap<String, FunctionDef>,
}

static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

/// The shared registry of built-in functions
pub fn registry() -> &'static FunctionRegistry {
    FUNCTION_REGISTRY.get_or_init(FunctionRegistry::new)
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: AHashMap::new(),
        };

        registry.register_logical_functions();
        registry.register_math_functions();
        registry.register_text_functions();
        registry.register_date_functions();
        registry.register_info_functions();

        registry
    }

    /// Look up a function by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&name.to_ascii_uppercase())
    }

    /// Check if a function exists (case-insensitive)
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Register a function
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_ascii_uppercase(), def);
    }

    /// Registered function names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.functions.values().map(|f| f.name).collect();
        names.sort_unstable();
        names
    }

    fn add(
        &mut self,
        name: &'static str,
        min_args: usize,
        max_args: Option<usize>,
        implementation: FunctionImpl,
    ) {
        self.register(FunctionDef {
            name,
            min_args,
            max_args,
            implementation,
            volatile: false,
        });
    }

    fn register_logical_functions(&mut self) {
        self.add("IF", 2, Some(3), logical::fn_if);
        self.add("AND", 1, None, logical::fn_and);
        self.add("OR", 1, None, logical::fn_or);
        self.add("NOT", 1, Some(1), logical::fn_not);
    }

    fn register_math_functions(&mut self) {
        // Aggregation
        self.add("SUM", 1, None, math::fn_sum);
        self.add("AVERAGE", 1, None, math::fn_average);
        self.add("MIN", 1, None, math::fn_min);
        self.add("MAX", 1, None, math::fn_max);
        self.add("COUNT", 1, None, math::fn_count);
        self.add("COUNTA", 1, None, statistical::fn_counta);

        self.add("ROUND", 1, Some(2), math::fn_round);
        self.add("FLOOR", 1, Some(2), math::fn_floor);
        self.add("CEILING", 1, Some(2), math::fn_ceiling);
        self.add("ABS", 1, Some(1), math::fn_abs);
        self.add("POWER", 2, Some(2), math::fn_power);
        self.add("SQRT", 1, Some(1), math::fn_sqrt);
    }

    fn register_text_functions(&mut self) {
        self.add("CONCAT", 1, None, text::fn_concat);
        self.add("CONCATENATE", 1, None, text::fn_concat);
        self.add("LEN", 1, Some(1), text::fn_len);
        self.add("LEFT", 1, Some(2), text::fn_left);
        self.add("RIGHT", 1, Some(2), text::fn_right);
        self.add("MID", 3, Some(3), text::fn_mid);
        self.add("LOWER", 1, Some(1), text::fn_lower);
        self.add("UPPER", 1, Some(1), text::fn_upper);
        self.add("TRIM", 1, Some(1), text::fn_trim);
        self.add("SUBSTITUTE", 3, Some(4), text::fn_substitute);
    }

    fn register_date_functions(&mut self) {
        // TODAY (volatile)
        self.register(FunctionDef {
            name: "TODAY",
            min_args: 0,
            max_args: Some(0),
            implementation: date::fn_today,
            volatile: true,
        });

        // NOW (volatile)
        self.register(FunctionDef {
            name: "NOW",
            min_args: 0,
            max_args: Some(0),
            implementation: date::fn_now,
            volatile: true,
        });

        self.add("YEAR", 1, Some(1), date::fn_year);
        self.add("MONTH", 1, Some(1), date::fn_month);
        self.add("DAY", 1, Some(1), date::fn_day);
        self.add("DATEADD", 3, Some(3), date::fn_dateadd);
        self.add("DATEDIF", 3, Some(3), date::fn_datedif);
    }

    fn register_info_functions(&mut self) {
        self.add("BLANK", 0, Some(0), info::fn_blank);
        self.add("ERROR", 0, Some(1), info::fn_error);
        self.add("ISBLANK", 1, Some(1), info::fn_isblank);
        self.add("ISNUMBER", 1, Some(1), info::fn_isnumber);
        self.add("ISTEXT", 1, Some(1), info::fn_istext);
    }
}

// === Argument helpers shared by the function modules ===

/// Numeric argument; blank counts as zero
pub(crate) fn number_arg(
    args: &[FormulaValue],
    index: usize,
    function: &str,
) -> FormulaResult<rust_decimal::Decimal> {
    let value = args.get(index).unwrap_or(&FormulaValue::Blank);
    value.as_number().ok_or_else(|| {
        FormulaError::Argument(format!(
            "{} expects a number for argument {}, got {}",
            function,
            index + 1,
            value.type_name()
        ))
    })
}

/// Optional numeric argument
pub(crate) fn optional_number_arg(
    args: &[FormulaValue],
    index: usize,
    function: &str,
) -> FormulaResult<Option<rust_decimal::Decimal>> {
    match args.get(index) {
        None => Ok(None),
        Some(_) => number_arg(args, index, function).map(Some),
    }
}

/// Non-negative whole number argument (character counts, positions)
pub(crate) fn count_arg(args: &[FormulaValue], index: usize, function: &str) -> FormulaResult<usize> {
    use rust_decimal::prelude::ToPrimitive;

    let n = number_arg(args, index, function)?.trunc();
    if n.is_sign_negative() && !n.is_zero() {
        return Err(FormulaError::Argument(format!(
            "{} expects a non-negative number for argument {}",
            function,
            index + 1
        )));
    }
    Ok(n.to_usize().unwrap_or(usize::MAX))
}

/// Text argument; any value converts to its display string
pub(crate) fn text_arg(args: &[FormulaValue], index: usize) -> String {
    args.get(index).map(FormulaValue::as_string).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert!(registry().contains("sum"));
        assert!(registry().contains("Sum"));
        assert!(registry().contains("CONCATENATE"));
        assert!(!registry().contains("VLOOKUP"));
        assert_eq!(registry().get("today").map(|f| f.volatile), Some(true));
        assert_eq!(registry().get("sum").map(|f| f.volatile), Some(false));
    }

    #[test]
    fn test_arity_description() {
        let get = |name| registry().get(name).map(FunctionDef::arity_description);
        assert_eq!(get("NOT").as_deref(), Some("1"));
        assert_eq!(get("IF").as_deref(), Some("2 to 3"));
        assert_eq!(get("SUM").as_deref(), Some("at least 1"));
        assert_eq!(get("TODAY").as_deref(), Some("0"));
    }

    #[test]
    fn test_names_cover_the_library() {
        let names = registry().names();
        for name in [
            "IF", "AND", "OR", "NOT", "SUM", "AVERAGE", "MIN", "MAX", "COUNT", "COUNTA",
            "CONCAT", "CONCATENATE", "LEN", "LEFT", "RIGHT", "MID", "LOWER", "UPPER", "TRIM",
            "SUBSTITUTE", "ROUND", "FLOOR", "CEILING", "ABS", "POWER", "SQRT", "TODAY", "NOW",
            "YEAR", "MONTH", "DAY", "DATEADD", "DATEDIF", "BLANK", "ERROR", "ISBLANK",
            "ISNUMBER", "ISTEXT",
        ] {
            assert!(names.contains(&name), "missing {}", name);
        }
    }
}
