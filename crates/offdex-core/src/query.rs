//! Equality queries over stored records

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::record::{json_eq, StoredObject};
use crate::storage::{StoreError, StoreResult};

/// Anything that can decide whether a record belongs in a result set.
///
/// Implemented for [`StorageQuery`] and for plain closures, so store methods
/// accept either a declarative query or an ad-hoc filter:
///
/// ```rust
/// use offdex_core::{Predicate, StorageQuery, StoredObject};
/// use serde_json::json;
///
/// let object = offdex_core::record(json!({"key": "a", "count": 2})).unwrap();
///
/// assert!(StorageQuery::new().field("count", 2).matches(&object));
/// assert!((|o: &StoredObject| o.contains_key("count")).matches(&object));
/// ```
pub trait Predicate {
    fn matches(&self, object: &StoredObject) -> bool;
}

impl<F> Predicate for F
where
    F: Fn(&StoredObject) -> bool,
{
    fn matches(&self, object: &StoredObject) -> bool {
        self(object)
    }
}

/// Conjunction of field equality tests.
///
/// A record matches when every queried field is present with an equal value;
/// fields not named by the query are unconstrained. An empty query matches
/// everything. Values compare with [`json_eq`](crate::json_eq): numbers by
/// numeric value, containers structurally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageQuery {
    args: Map<String, Value>,
}

impl StorageQuery {
    /// Create an empty query (matches every record).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a query from a field → expected value mapping.
    pub fn from_args(args: Map<String, Value>) -> Self {
        Self { args }
    }

    /// Build a query from a JSON value, which must be an object.
    pub fn from_json(value: Value) -> StoreResult<Self> {
        match value {
            Value::Object(args) => Ok(Self { args }),
            _ => Err(StoreError::InvalidArgument(
                "query must be a JSON object".into(),
            )),
        }
    }

    /// Require `name` to equal `value`.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    pub fn args(&self) -> &Map<String, Value> {
        &self.args
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

impl Predicate for StorageQuery {
    fn matches(&self, object: &StoredObject) -> bool {
        self.args
            .iter()
            .all(|(name, expected)| {
                object
                    .get(name)
                    .map_or(false, |actual| json_eq(actual, expected))
            })
    }
}
