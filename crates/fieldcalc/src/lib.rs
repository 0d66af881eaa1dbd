//! # fieldcalc
//!
//! A formula engine for computed record fields.
//!
//! Fields are referenced by display name in braces and formulas are written in
//! a small spreadsheet-style language:
//!
//! ```text
//! IF({Quantity} >= 10, ROUND({Price} * 0.9, 2), {Price}) & " EUR"
//! ```
//!
//! ## Features
//!
//! - Tokenizer and recursive descent parser with a fixed precedence table
//! - Decimal arithmetic (no binary floating point)
//! - Logic, aggregation, text, math and date functions
//! - Runtime errors reported as `#ERROR:` values instead of failures
//! - Dependency analysis and a cross-field [`FormulaGraph`] for cycle
//!   detection and recomputation order
//!
//! ## Example
//!
//! ```rust
//! use fieldcalc::prelude::*;
//!
//! let catalog = FieldCatalog::from_fields([
//!     FieldDefinition::new("fld_qty", "Quantity", FieldType::Number),
//!     FieldDefinition::new("fld_price", "Price", FieldType::Number),
//! ]).unwrap();
//!
//! let record = RecordSnapshot::new()
//!     .with("fld_qty", 12)
//!     .with("fld_price", Decimal::new(1999, 2));
//!
//! let formula = "IF({Quantity} >= 10, ROUND({Price} * 0.9, 2), {Price})";
//! validate_syntax(formula).unwrap();
//!
//! let result = evaluate_formula(formula, &catalog, &record);
//! assert_eq!(result.to_string(), "17.99");
//! ```

pub mod graph;
pub mod prelude;

pub use graph::FormulaGraph;

// Re-export core types
pub use fieldcalc_core::{
    format_date, Decimal, Error, FieldCatalog, FieldDefinition, FieldId, FieldType, FieldValue,
    NaiveDate, NaiveDateTime, RecordSnapshot, Result,
};

// Re-export formula types
pub use fieldcalc_formula::{
    dependencies, evaluate, evaluate_formula, parse, parse_formula, referenced_names, tokenize,
    validate_syntax, BinaryOperator, DateArithmetic, EngineOptions, ErrorValue,
    EvaluationContext, EvaluationResult, FormulaEngine, FormulaError, FormulaExpr, FormulaResult,
    FormulaValue, Token, TokenKind, UnaryOperator, UnknownCharacterPolicy,
};
