//! # fieldcalc-formula
//!
//! Formula tokenizer, parser and evaluator for fieldcalc computed fields.
//!
//! This crate provides:
//! - Tokenizing and parsing (text → tokens → AST)
//! - Evaluation against one record (AST → value)
//! - Built-in functions for logic, math, text and dates
//! - Dependency analysis (which fields a formula reads)
//!
//! Formulas reference fields by display name in braces, e.g.
//! `IF({Quantity} > 10, {Price} * 0.9, {Price})`. All arithmetic is decimal.
//!
//! ## Example
//!
//! ```rust
//! use fieldcalc_formula::{evaluate, parse_formula, EvaluationContext};
//!
//! let ast = parse_formula("=ROUND(2.345, 2) + 0.1").unwrap();
//! let result = evaluate(&ast, &EvaluationContext::simple()).unwrap();
//! assert_eq!(result.to_string(), "2.45");
//! ```

pub mod ast;
pub mod dependency;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod options;
pub mod parser;

pub use ast::{BinaryOperator, FormulaExpr, UnaryOperator};
pub use dependency::{dependencies, referenced_names};
pub use engine::{evaluate_formula, validate_syntax, ErrorValue, EvaluationResult, FormulaEngine};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, EvaluationContext, FormulaValue};
pub use lexer::{tokenize, Token, TokenKind};
pub use options::{DateArithmetic, EngineOptions, UnknownCharacterPolicy};
pub use parser::{parse, parse_formula};
