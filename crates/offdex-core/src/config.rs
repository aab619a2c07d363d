//! Store configuration

use serde::{Deserialize, Serialize};

/// Default database name.
pub const DEFAULT_DATABASE: &str = "offdex";

/// Default object store name inside the database.
pub const DEFAULT_STORE: &str = "objects";

/// Default key field for stored records.
pub const DEFAULT_KEY_FIELD: &str = "key";

/// Where and how records are persisted.
///
/// The key field doubles as the backend key path: every stored record must
/// carry it as a string, and it is never rewritten once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database name (one per application or per user namespace)
    pub database: String,
    /// Object store name within the database
    pub store: String,
    /// Field used as the unique record key
    pub key_field: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            store: DEFAULT_STORE.to_string(),
            key_field: DEFAULT_KEY_FIELD.to_string(),
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layout used by older offdex databases: `id`-keyed records.
    pub fn legacy() -> Self {
        Self::default().key_field("id")
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn store(mut self, store: impl Into<String>) -> Self {
        self.store = store.into();
        self
    }

    pub fn key_field(mut self, key_field: impl Into<String>) -> Self {
        self.key_field = key_field.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.database, "offdex");
        assert_eq!(config.store, "objects");
        assert_eq!(config.key_field, "key");
        assert_eq!(StoreConfig::legacy().key_field, "id");
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: StoreConfig = serde_json::from_str(r#"{"database":"notes"}"#).unwrap();
        assert_eq!(config.database, "notes");
        assert_eq!(config.store, "objects");
        assert_eq!(config.key_field, "key");
    }
}
