//! # fieldcalc-core
//!
//! Core data structures for the fieldcalc formula engine.
//!
//! This crate provides the types the formula engine consumes from the record
//! storage layer:
//! - [`FieldDefinition`] and [`FieldCatalog`] - Field ids, display names and declared types
//! - [`RecordSnapshot`] - The stored values of one record
//! - [`FieldValue`] - A single stored value (number, text, boolean, date, or blank)
//!
//! ## Example
//!
//! ```rust
//! use fieldcalc_core::{FieldCatalog, FieldDefinition, FieldType, RecordSnapshot};
//!
//! let mut catalog = FieldCatalog::new();
//! catalog.add(FieldDefinition::new("fld_amount", "Amount", FieldType::Number)).unwrap();
//!
//! let record = RecordSnapshot::new().with("fld_amount", 10);
//! let id = catalog.resolve("Amount").unwrap();
//! assert!(record.get(id).is_some());
//! ```

pub mod catalog;
pub mod error;
pub mod field;
pub mod record;
pub mod value;

// Re-exports for convenience
pub use catalog::FieldCatalog;
pub use error::{Error, Result};
pub use field::{FieldDefinition, FieldId, FieldType};
pub use record::RecordSnapshot;
pub use value::{format_date, FieldValue};

pub use chrono::{NaiveDate, NaiveDateTime};
pub use rust_decimal::Decimal;
