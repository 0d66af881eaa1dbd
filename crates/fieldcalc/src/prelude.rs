//! Prelude module - common imports for fieldcalc users
//!
//! ```rust
//! use fieldcalc::prelude::*;
//! ```

pub use crate::{
    // Functions
    dependencies,
    evaluate_formula,
    validate_syntax,

    // Numbers and dates
    Decimal,
    NaiveDate,
    NaiveDateTime,

    // Engine
    EngineOptions,
    // Error types
    Error,
    ErrorValue,
    EvaluationResult,
    // Field model
    FieldCatalog,
    FieldDefinition,
    FieldId,
    FieldType,
    FieldValue,
    FormulaEngine,
    FormulaError,
    // Dependency graph
    FormulaGraph,
    FormulaValue,
    RecordSnapshot,
    Result,
};
