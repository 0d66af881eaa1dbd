//! Field identity and definitions

use std::fmt;

/// Stable identifier of a field, owned by the record storage layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FieldId(String);

impl FieldId {
    /// Create a new field id
    pub fn new<S: Into<String>>(id: S) -> Self {
        FieldId(id.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FieldId {
    fn from(s: &str) -> Self {
        FieldId::new(s)
    }
}

impl From<String> for FieldId {
    fn from(s: String) -> Self {
        FieldId(s)
    }
}

impl AsRef<str> for FieldId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Declared result type of a field
///
/// Advisory only: formulas are not type-checked against it. It tells the
/// caller how to interpret a computed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Date,
    Boolean,
}

impl FieldType {
    /// Lowercase name used in messages
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Definition of a single field
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDefinition {
    /// Stable id
    pub id: FieldId,
    /// Human-readable name, referenced in formulas as `{display_name}`
    pub display_name: String,
    /// Declared type
    pub declared_type: FieldType,
    /// Formula text for computed fields
    #[cfg_attr(feature = "serde", serde(default))]
    pub formula: Option<String>,
}

impl FieldDefinition {
    /// Create a plain (stored) field
    pub fn new<I, N>(id: I, display_name: N, declared_type: FieldType) -> Self
    where
        I: Into<FieldId>,
        N: Into<String>,
    {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            declared_type,
            formula: None,
        }
    }

    /// Create a computed field backed by a formula
    pub fn computed<I, N, F>(id: I, display_name: N, declared_type: FieldType, formula: F) -> Self
    where
        I: Into<FieldId>,
        N: Into<String>,
        F: Into<String>,
    {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            declared_type,
            formula: Some(formula.into()),
        }
    }

    /// Check if this field is computed by a formula
    pub fn is_computed(&self) -> bool {
        self.formula.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_id_display() {
        let id = FieldId::from("fld_amount");
        assert_eq!(id.to_string(), "fld_amount");
        assert_eq!(id.as_str(), "fld_amount");
    }

    #[test]
    fn test_computed_field() {
        let plain = FieldDefinition::new("a", "Amount", FieldType::Number);
        assert!(!plain.is_computed());

        let total = FieldDefinition::computed("t", "Total", FieldType::Number, "{Amount} * 2");
        assert!(total.is_computed());
        assert_eq!(total.formula.as_deref(), Some("{Amount} * 2"));
    }
}
