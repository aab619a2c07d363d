//! Record of independently observable fields

use std::collections::BTreeMap;

use serde_json::Value;

use super::ObservableValue;
use crate::record::StoredObject;

/// Every field of a record, each wrapped in its own [`ObservableValue`].
///
/// Fields start with a `Value::Null` fallback rather than their original
/// value; call [`ObservableValue::set_fallback`] on a field to get
/// rollback-to-original on `reset`. There is no object-level notification.
#[derive(Debug, Default)]
pub struct ObservableObject {
    fields: BTreeMap<String, ObservableValue<Value>>,
}

impl ObservableObject {
    pub fn new(object: &StoredObject) -> Self {
        let fields = object
            .iter()
            .map(|(name, value)| (name.clone(), ObservableValue::new(value.clone())))
            .collect();
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&ObservableValue<Value>> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &ObservableValue<Value>)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Current field values collected back into a record.
    pub fn snapshot(&self) -> StoredObject {
        self.fields
            .iter()
            .map(|(name, value)| (name.clone(), value.get()))
            .collect()
    }
}

impl From<StoredObject> for ObservableObject {
    fn from(object: StoredObject) -> Self {
        Self::new(&object)
    }
}
