//! Formula engine
//!
//! The public boundary used by the record storage layer: validate a formula
//! when a field is saved, evaluate it against a record when the record is
//! read, and report the fields it depends on.
//!
//! # Example
//!
//! ```rust
//! use fieldcalc_core::{FieldCatalog, FieldDefinition, FieldType, RecordSnapshot};
//! use fieldcalc_formula::{EvaluationResult, FormulaEngine};
//!
//! let catalog = FieldCatalog::from_fields([
//!     FieldDefinition::new("f1", "Amount", FieldType::Number),
//! ]).unwrap();
//! let record = RecordSnapshot::new().with("f1", 40);
//!
//! let engine = FormulaEngine::default();
//! engine.validate_syntax("{Amount} * 1.5").unwrap();
//!
//! let result = engine.evaluate("{Amount} * 1.5", &catalog, &record);
//! assert_eq!(result.to_string(), "60");
//!
//! let result = engine.evaluate("{Amount} / 0", &catalog, &record);
//! assert!(matches!(result, EvaluationResult::Error(_)));
//! assert_eq!(result.to_string(), "#ERROR: Division by zero");
//! ```

use crate::ast::FormulaExpr;
use crate::dependency::{dependencies_with, referenced_names_with};
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{evaluate, EvaluationContext, FormulaValue};
use crate::lexer::{tokenize_with, Token};
use crate::options::EngineOptions;
use crate::parser::parse_formula_with;
use ahash::AHashSet;
use chrono::NaiveDateTime;
use fieldcalc_core::{FieldCatalog, FieldId, FieldValue, RecordSnapshot};
use std::fmt;

/// A runtime failure represented as data
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorValue {
    message: String,
}

impl ErrorValue {
    /// Create an error value
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message without the `#ERROR:` prefix
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#ERROR: {}", self.message)
    }
}

impl From<FormulaError> for ErrorValue {
    fn from(err: FormulaError) -> Self {
        ErrorValue::new(err.to_string())
    }
}

/// Outcome of evaluating a formula against a record
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EvaluationResult {
    Value(FormulaValue),
    Error(ErrorValue),
}

impl EvaluationResult {
    /// Check if evaluation failed
    pub fn is_error(&self) -> bool {
        matches!(self, EvaluationResult::Error(_))
    }

    /// The value, if evaluation succeeded
    pub fn value(&self) -> Option<&FormulaValue> {
        match self {
            EvaluationResult::Value(v) => Some(v),
            EvaluationResult::Error(_) => None,
        }
    }

    /// The error, if evaluation failed
    pub fn error(&self) -> Option<&ErrorValue> {
        match self {
            EvaluationResult::Value(_) => None,
            EvaluationResult::Error(e) => Some(e),
        }
    }

    /// Convert into a stored field value, or the error
    pub fn into_field_value(self) -> Result<FieldValue, ErrorValue> {
        match self {
            EvaluationResult::Value(v) => Ok(v.into()),
            EvaluationResult::Error(e) => Err(e),
        }
    }
}

impl From<FormulaResult<FormulaValue>> for EvaluationResult {
    fn from(result: FormulaResult<FormulaValue>) -> Self {
        match result {
            Ok(value) => EvaluationResult::Value(value),
            Err(err) => EvaluationResult::Error(err.into()),
        }
    }
}

impl fmt::Display for EvaluationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationResult::Value(v) => write!(f, "{}", v),
            EvaluationResult::Error(e) => write!(f, "{}", e),
        }
    }
}

/// Formula engine with options and an optional fixed clock
#[derive(Debug, Clone, Default)]
pub struct FormulaEngine {
    options: EngineOptions,
    clock: Option<NaiveDateTime>,
}

impl FormulaEngine {
    /// Create an engine with the given options
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            clock: None,
        }
    }

    /// Pin the clock read by TODAY() and NOW()
    ///
    /// Useful when recomputing many records so they all see the same instant.
    pub fn with_clock(mut self, now: NaiveDateTime) -> Self {
        self.clock = Some(now);
        self
    }

    /// Engine options
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Tokenize a formula
    pub fn tokenize(&self, formula: &str) -> FormulaResult<Vec<Token>> {
        tokenize_with(formula, &self.options)
    }

    /// Parse a formula into an expression tree
    pub fn parse(&self, formula: &str) -> FormulaResult<FormulaExpr> {
        parse_formula_with(formula, &self.options)
    }

    /// Check that a formula is well formed
    ///
    /// Reports unbalanced parentheses, unknown functions, wrong argument
    /// counts and every other definition-time error. References to unknown
    /// fields are not errors.
    pub fn validate_syntax(&self, formula: &str) -> FormulaResult<()> {
        match self.parse(formula) {
            Ok(_) => Ok(()),
            Err(err) => {
                tracing::debug!(formula, error = %err, "formula rejected");
                Err(err)
            }
        }
    }

    /// Evaluation context for one record
    pub fn context<'a>(
        &self,
        catalog: &'a FieldCatalog,
        record: &'a RecordSnapshot,
    ) -> EvaluationContext<'a> {
        let ctx = EvaluationContext::new(catalog, record)
            .with_date_arithmetic(self.options.date_arithmetic);
        match self.clock {
            Some(now) => ctx.with_clock(now),
            None => ctx,
        }
    }

    /// Evaluate a formula against one record
    ///
    /// Never fails: parse and runtime errors both become
    /// [`EvaluationResult::Error`].
    pub fn evaluate(
        &self,
        formula: &str,
        catalog: &FieldCatalog,
        record: &RecordSnapshot,
    ) -> EvaluationResult {
        match self.parse(formula) {
            Ok(expr) => self.evaluate_parsed(&expr, catalog, record),
            Err(err) => {
                tracing::debug!(formula, error = %err, "formula failed to parse at evaluation");
                EvaluationResult::Error(err.into())
            }
        }
    }

    /// Evaluate an already parsed formula against one record
    pub fn evaluate_parsed(
        &self,
        expr: &FormulaExpr,
        catalog: &FieldCatalog,
        record: &RecordSnapshot,
    ) -> EvaluationResult {
        let ctx = self.context(catalog, record);
        let result = evaluate(expr, &ctx);
        if let Err(err) = &result {
            tracing::trace!(error = %err, "formula evaluated to an error");
        }
        result.into()
    }

    /// Field ids a formula depends on
    pub fn dependencies(
        &self,
        formula: &str,
        catalog: &FieldCatalog,
    ) -> FormulaResult<AHashSet<FieldId>> {
        dependencies_with(formula, catalog, &self.options)
    }

    /// Display names a formula references, including unknown ones
    pub fn referenced_names(&self, formula: &str) -> FormulaResult<Vec<String>> {
        referenced_names_with(formula, &self.options)
    }

    /// Check if a formula calls a clock-dependent function (TODAY, NOW)
    pub fn is_volatile(&self, formula: &str) -> FormulaResult<bool> {
        Ok(self.parse(formula)?.is_volatile())
    }
}

/// Check that a formula is well formed, with default options
pub fn validate_syntax(formula: &str) -> FormulaResult<()> {
    FormulaEngine::default().validate_syntax(formula)
}

/// Evaluate a formula against one record, with default options
pub fn evaluate_formula(
    formula: &str,
    catalog: &FieldCatalog,
    record: &RecordSnapshot,
) -> EvaluationResult {
    FormulaEngine::default().evaluate(formula, catalog, record)
}
