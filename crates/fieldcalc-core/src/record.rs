//! Record snapshots

use crate::field::FieldId;
use crate::value::FieldValue;
use ahash::AHashMap;

/// Current field values of exactly one record
///
/// Fields without an entry are treated as blank by the formula engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSnapshot {
    values: AHashMap<FieldId, FieldValue>,
}

impl RecordSnapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with<I, V>(mut self, id: I, value: V) -> Self
    where
        I: Into<FieldId>,
        V: Into<FieldValue>,
    {
        self.set(id, value);
        self
    }

    /// Set the value of a field, returning the previous value
    pub fn set<I, V>(&mut self, id: I, value: V) -> Option<FieldValue>
    where
        I: Into<FieldId>,
        V: Into<FieldValue>,
    {
        self.values.insert(id.into(), value.into())
    }

    /// Get the value of a field
    pub fn get(&self, id: &FieldId) -> Option<&FieldValue> {
        self.values.get(id)
    }

    /// Remove a field's value
    pub fn remove(&mut self, id: &FieldId) -> Option<FieldValue> {
        self.values.remove(id)
    }

    /// Iterate over stored values (unordered)
    pub fn iter(&self) -> impl Iterator<Item = (&FieldId, &FieldValue)> {
        self.values.iter()
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the snapshot holds no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<I, V> FromIterator<(I, V)> for RecordSnapshot
where
    I: Into<FieldId>,
    V: Into<FieldValue>,
{
    fn from_iter<T: IntoIterator<Item = (I, V)>>(iter: T) -> Self {
        let mut record = Self::new();
        for (id, value) in iter {
            record.set(id, value);
        }
        record
    }
}
