//! In-memory storage backend
//!
//! A BTreeMap-based implementation for testing and native use. Records are
//! kept in key order, which is the order a forward cursor visits them.
//! Not persistent: data lives as long as the last clone of the backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::config::StoreConfig;
use crate::record::{key_of, StoredObject};
use crate::storage::error::StoreResult;
use crate::storage::traits::{Backend, ScanFilter};

/// In-memory object store.
///
/// Cloning shares the underlying records, so two stores built over clones of
/// one backend see each other's writes (the same way two connections to one
/// browser database do).
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    key_field: String,
    records: Arc<RwLock<BTreeMap<String, StoredObject>>>,
}

impl MemoryBackend {
    /// Create an empty backend keyed by `key_field`.
    pub fn new(key_field: impl Into<String>) -> Self {
        Self {
            key_field: key_field.into(),
            records: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Create a backend with initial records.
    pub fn with_records(
        key_field: impl Into<String>,
        records: impl IntoIterator<Item = StoredObject>,
    ) -> StoreResult<Self> {
        let backend = Self::new(key_field);
        {
            let mut map = backend.records.write();
            for object in records {
                let key = key_of(&object, &backend.key_field)?.to_string();
                map.insert(key, object);
            }
        }
        Ok(backend)
    }

    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Backend for MemoryBackend {
    async fn open(config: &StoreConfig) -> StoreResult<Self> {
        Ok(Self::new(config.key_field.clone()))
    }

    async fn get(&self, key: &str) -> StoreResult<Option<StoredObject>> {
        Ok(self.records.read().get(key).cloned())
    }

    async fn put(&self, object: &StoredObject) -> StoreResult<()> {
        let key = key_of(object, &self.key_field)?.to_string();
        trace!(%key, "memory put");
        self.records.write().insert(key, object.clone());
        Ok(())
    }

    async fn put_all(&self, objects: &[StoredObject]) -> StoreResult<()> {
        // Validate every key before touching the map so a bad record
        // leaves the store untouched.
        let keyed = objects
            .iter()
            .map(|object| Ok((key_of(object, &self.key_field)?.to_string(), object.clone())))
            .collect::<StoreResult<Vec<_>>>()?;

        let mut map = self.records.write();
        for (key, object) in keyed {
            map.insert(key, object);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.records.write().remove(key);
        Ok(())
    }

    async fn scan(&self, filter: ScanFilter<'_>) -> StoreResult<Vec<StoredObject>> {
        Ok(self
            .records
            .read()
            .values()
            .filter(|object| filter(*object))
            .cloned()
            .collect())
    }

    async fn delete_where(&self, filter: ScanFilter<'_>) -> StoreResult<usize> {
        let mut map = self.records.write();
        let before = map.len();
        map.retain(|_, object| !filter(&*object));
        Ok(before - map.len())
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.len())
    }
}
