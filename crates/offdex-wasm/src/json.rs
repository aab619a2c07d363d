//! JSON decoding for values arriving from JavaScript

use offdex_core::{record, StorageQuery, StoreConfig, StoreError, StoreResult, StoredObject};
use serde::Serialize;
use serde_json::Value;

/// Parse an optional store configuration.
///
/// `None` or an empty string gives the default layout; missing fields fall
/// back to their defaults.
pub fn parse_config(json: Option<&str>) -> StoreResult<StoreConfig> {
    match json.map(str::trim) {
        None | Some("") => Ok(StoreConfig::default()),
        Some(json) => Ok(serde_json::from_str(json)?),
    }
}

/// Parse a single record, which must be a JSON object.
pub fn parse_record(json: &str) -> StoreResult<StoredObject> {
    record(serde_json::from_str(json)?)
}

/// Parse a JSON array of records.
pub fn parse_records(json: &str) -> StoreResult<Vec<StoredObject>> {
    match serde_json::from_str(json)? {
        Value::Array(items) => items.into_iter().map(record).collect(),
        _ => Err(StoreError::InvalidArgument(
            "expected a JSON array of objects".into(),
        )),
    }
}

/// Parse a storage query, which must be a JSON object.
pub fn parse_query(json: &str) -> StoreResult<StorageQuery> {
    StorageQuery::from_json(serde_json::from_str(json)?)
}

/// Parse an arbitrary JSON value (field assignments).
pub fn parse_value(json: &str) -> StoreResult<Value> {
    Ok(serde_json::from_str(json)?)
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> StoreResult<String> {
    Ok(serde_json::to_string(value)?)
}
