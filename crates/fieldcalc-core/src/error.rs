//! Error types for fieldcalc-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in fieldcalc-core
#[derive(Debug, Error)]
pub enum Error {
    /// A field with this display name is already in the catalog
    #[error("Field name already exists: {0}")]
    DuplicateFieldName(String),

    /// A field with this id is already in the catalog
    #[error("Field id already exists: {0}")]
    DuplicateFieldId(String),

    /// Display name cannot be referenced from a formula
    #[error("Invalid field name: {0}")]
    InvalidFieldName(String),

    /// Circular reference detected between formula fields
    #[error("Circular reference detected: {0}")]
    CircularReference(String),

    /// Formula parse error
    #[error("Formula parse error: {0}")]
    FormulaParse(String),
}
