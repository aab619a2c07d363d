//! Stored record representation

use serde_json::{Map, Value};

use crate::storage::{StoreError, StoreResult};

/// A persisted record: a JSON object carrying a string key field plus
/// arbitrary additional fields.
pub type StoredObject = Map<String, Value>;

/// Build a [`StoredObject`] from a JSON value, which must be an object.
pub fn record(value: Value) -> StoreResult<StoredObject> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidRecord(format!(
            "expected a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

/// Read the key of a record.
///
/// Fails with `StoreError::InvalidRecord` if the key field is missing or is
/// not a string.
pub fn key_of<'a>(object: &'a StoredObject, key_field: &str) -> StoreResult<&'a str> {
    match object.get(key_field) {
        Some(Value::String(key)) => Ok(key),
        Some(other) => Err(StoreError::InvalidRecord(format!(
            "key field '{}' must be a string, got {}",
            key_field,
            kind_of(other)
        ))),
        None => Err(StoreError::InvalidRecord(format!(
            "missing key field '{}'",
            key_field
        ))),
    }
}

/// Compare two JSON values the way JavaScript's `===` sees them after a
/// JSON round-trip.
///
/// Numbers compare by numeric value, so `2` equals `2.0` (IndexedDB hands
/// back `5.0` as `5`). Arrays and objects compare element by element.
pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if x.is_f64() || y.is_f64() {
                x.as_f64() == y.as_f64()
            } else {
                x == y
            }
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(name, x)| ys.get(name).map_or(false, |y| json_eq(x, y)))
        }
        _ => a == b,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_eq_numbers() {
        assert!(json_eq(&json!(2), &json!(2.0)));
        assert!(json_eq(&json!(-0.0), &json!(0)));
        assert!(!json_eq(&json!(2), &json!(2.5)));
        assert!(!json_eq(&json!(1), &json!("1")));
        assert!(json_eq(&json!(u64::MAX), &json!(u64::MAX)));
        assert!(!json_eq(&json!(u64::MAX), &json!(u64::MAX - 1)));
    }

    #[test]
    fn test_json_eq_nested() {
        assert!(json_eq(
            &json!({"a": [1, {"b": 2.0}], "c": null}),
            &json!({"c": null, "a": [1.0, {"b": 2}]})
        ));
        assert!(!json_eq(&json!([1, 2]), &json!([1, 2, 3])));
        assert!(!json_eq(&json!({"a": 1}), &json!({"a": 1, "b": 1})));
        assert!(!json_eq(&json!({"a": null}), &json!({"b": null})));
    }

    #[test]
    fn test_key_of() {
        let object = record(json!({"key": "a", "count": 1})).unwrap();
        assert_eq!(key_of(&object, "key").unwrap(), "a");
    }

    #[test]
    fn test_key_of_missing() {
        let object = record(json!({"count": 1})).unwrap();
        let result = key_of(&object, "key");
        assert!(matches!(result, Err(StoreError::InvalidRecord(_))));
    }

    #[test]
    fn test_key_of_non_string() {
        let object = record(json!({"key": 7})).unwrap();
        let err = key_of(&object, "key").unwrap_err();
        assert!(err.to_string().contains("must be a string, got number"));
    }

    #[test]
    fn test_record_rejects_non_object() {
        assert!(matches!(
            record(json!([1, 2])),
            Err(StoreError::InvalidRecord(_))
        ));
    }
}
