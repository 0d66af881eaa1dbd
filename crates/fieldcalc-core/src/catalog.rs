//! Field catalog: ordered field definitions indexed by name and id

use crate::error::{Error, Result};
use crate::field::{FieldDefinition, FieldId};
use ahash::AHashMap;

/// Ordered collection of field definitions
///
/// Definitions live in a vector in insertion order; the two maps hold
/// indexes into it. Display names and ids are unique.
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    fields: Vec<FieldDefinition>,
    by_name: AHashMap<String, usize>,
    by_id: AHashMap<FieldId, usize>,
}

impl FieldCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from definitions, failing on the first conflict
    pub fn from_fields<I>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = FieldDefinition>,
    {
        let mut catalog = Self::new();
        for field in fields {
            catalog.add(field)?;
        }
        Ok(catalog)
    }

    /// Add a field definition
    pub fn add(&mut self, field: FieldDefinition) -> Result<()> {
        validate_display_name(&field.display_name)?;

        if self.by_name.contains_key(&field.display_name) {
            return Err(Error::DuplicateFieldName(field.display_name));
        }
        if self.by_id.contains_key(&field.id) {
            return Err(Error::DuplicateFieldId(field.id.to_string()));
        }

        let index = self.fields.len();
        self.by_name.insert(field.display_name.clone(), index);
        self.by_id.insert(field.id.clone(), index);
        self.fields.push(field);
        Ok(())
    }

    /// Look up a field by its display name
    pub fn get_by_name(&self, name: &str) -> Option<&FieldDefinition> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    /// Look up a field by id
    pub fn get(&self, id: &FieldId) -> Option<&FieldDefinition> {
        self.by_id.get(id).map(|&i| &self.fields[i])
    }

    /// Resolve a display name to its field id
    pub fn resolve(&self, name: &str) -> Option<&FieldId> {
        self.get_by_name(name).map(|f| &f.id)
    }

    /// Iterate over definitions in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter()
    }

    /// Iterate over fields computed by a formula
    pub fn computed_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| f.is_computed())
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn validate_display_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidFieldName("name is empty".into()));
    }
    if name != name.trim() {
        return Err(Error::InvalidFieldName(format!(
            "'{}' has leading or trailing whitespace",
            name
        )));
    }
    if name.contains('{') || name.contains('}') {
        return Err(Error::InvalidFieldName(format!(
            "'{}' contains a brace",
            name
        )));
    }
    Ok(())
}

impl<'a> IntoIterator for &'a FieldCatalog {
    type Item = &'a FieldDefinition;
    type IntoIter = std::slice::Iter<'a, FieldDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldType;

    fn sample() -> FieldCatalog {
        FieldCatalog::from_fields([
            FieldDefinition::new("f1", "Amount", FieldType::Number),
            FieldDefinition::new("f2", "Rate", FieldType::Number),
            FieldDefinition::computed("f3", "Total", FieldType::Number, "{Amount} * {Rate}"),
        ])
        .unwrap()
    }

    #[test]
    fn test_lookup() {
        let catalog = sample();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.resolve("Rate"), Some(&FieldId::from("f2")));
        assert_eq!(catalog.resolve("rate"), None);
        assert_eq!(
            catalog.get(&FieldId::from("f1")).map(|f| f.display_name.as_str()),
            Some("Amount")
        );
    }

    #[test]
    fn test_insertion_order() {
        let catalog = sample();
        let names: Vec<_> = catalog.iter().map(|f| f.display_name.as_str()).collect();
        assert_eq!(names, vec!["Amount", "Rate", "Total"]);

        let computed: Vec<_> = catalog.computed_fields().map(|f| f.id.as_str()).collect();
        assert_eq!(computed, vec!["f3"]);
    }

    #[test]
    fn test_duplicates_rejected() {
        let mut catalog = sample();
        let err = catalog
            .add(FieldDefinition::new("f9", "Amount", FieldType::Text))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateFieldName(_)));

        let err = catalog
            .add(FieldDefinition::new("f1", "Other", FieldType::Text))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateFieldId(_)));
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut catalog = FieldCatalog::new();
        for bad in ["", "  ", "a{b", "}", " padded"] {
            let err = catalog
                .add(FieldDefinition::new("x", bad, FieldType::Text))
                .unwrap_err();
            assert!(matches!(err, Error::InvalidFieldName(_)), "{:?}", bad);
        }
        assert!(catalog.is_empty());
    }
}
