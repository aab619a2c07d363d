//! IndexedDB backend for [`offdex_core::ObjectStore`].
//!
//! Each trait method opens its own transaction on the configured object
//! store and resolves once that transaction has completed, so a write that
//! returns `Ok` is durable.

use offdex_core::{Backend, ScanFilter, StoreConfig, StoreError, StoredObject, DB};
use tracing::{debug, trace};
use wasm_bindgen::prelude::*;
use web_sys::{IdbDatabase, IdbTransactionMode};

use crate::error::{describe, IndexedDbError};
use crate::idb;

type StoreResult<T> = std::result::Result<T, StoreError>;

/// Browser-persistent object store.
///
/// Records are stored as plain JS objects (JSON-compatible values only) in
/// `config.store`, keyed in-line by `config.key_field`.
pub struct IndexedDbBackend {
    db: IdbDatabase,
    config: StoreConfig,
}

impl IndexedDbBackend {
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Close the database connection.
    pub fn close(&self) {
        self.db.close();
    }

    /// Delete the database (for testing/cleanup).
    pub async fn delete_database(db_name: &str) -> crate::Result<()> {
        idb::delete_database(db_name).await
    }

    fn transaction(
        &self,
        mode: IdbTransactionMode,
    ) -> StoreResult<(web_sys::IdbTransaction, web_sys::IdbObjectStore)> {
        Ok(idb::begin_transaction(&self.db, &self.config.store, mode)?)
    }
}

impl std::fmt::Debug for IndexedDbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexedDbBackend")
            .field("database", &self.db.name())
            .field("config", &self.config)
            .finish()
    }
}

impl Backend for IndexedDbBackend {
    async fn open(config: &StoreConfig) -> StoreResult<Self> {
        let db = idb::open_database(&config.database, &config.store, &config.key_field).await?;
        debug!(
            "{} opened IndexedDB {}/{} keyed by '{}'",
            DB, config.database, config.store, config.key_field
        );
        Ok(Self {
            db,
            config: config.clone(),
        })
    }

    async fn get(&self, key: &str) -> StoreResult<Option<StoredObject>> {
        let (tx, store) = self.transaction(IdbTransactionMode::Readonly)?;

        let req = store
            .get(&JsValue::from_str(key))
            .map_err(|e| StoreError::Backend(format!("IDB get: {}", describe(&e))))?;
        let result = idb::await_request(&req).await?;
        idb::await_transaction(&tx).await?;

        if result.is_undefined() || result.is_null() {
            return Ok(None);
        }
        Ok(Some(js_to_record(&result)?))
    }

    async fn put(&self, object: &StoredObject) -> StoreResult<()> {
        let value = record_to_js(object)?;
        let (tx, store) = self.transaction(IdbTransactionMode::Readwrite)?;

        let req = store
            .put(&value)
            .map_err(|e| StoreError::Backend(format!("IDB put: {}", describe(&e))))?;
        idb::await_request(&req).await?;
        idb::await_transaction(&tx).await?;
        Ok(())
    }

    async fn put_all(&self, objects: &[StoredObject]) -> StoreResult<()> {
        // Convert up front so a bad record fails before the transaction opens.
        let values = objects
            .iter()
            .map(record_to_js)
            .collect::<Result<Vec<_>, _>>()?;

        let (tx, store) = self.transaction(IdbTransactionMode::Readwrite)?;
        for value in &values {
            if let Err(e) = store.put(value) {
                let _ = tx.abort();
                return Err(StoreError::Backend(format!("IDB put: {}", describe(&e))));
            }
        }
        idb::await_transaction(&tx).await?;
        trace!("{} IndexedDB put {} records", DB, values.len());
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let (tx, store) = self.transaction(IdbTransactionMode::Readwrite)?;

        let req = store
            .delete(&JsValue::from_str(key))
            .map_err(|e| StoreError::Backend(format!("IDB delete: {}", describe(&e))))?;
        idb::await_request(&req).await?;
        idb::await_transaction(&tx).await?;
        Ok(())
    }

    async fn scan(&self, filter: ScanFilter<'_>) -> StoreResult<Vec<StoredObject>> {
        let (tx, store) = self.transaction(IdbTransactionMode::Readonly)?;

        let mut matches = Vec::new();
        idb::for_each_cursor(&store, |cursor| {
            let object = js_to_record(&cursor.value()?)?;
            if filter(&object) {
                matches.push(object);
            }
            Ok(())
        })
        .await?;
        idb::await_transaction(&tx).await?;

        Ok(matches)
    }

    async fn delete_where(&self, filter: ScanFilter<'_>) -> StoreResult<usize> {
        let (tx, store) = self.transaction(IdbTransactionMode::Readwrite)?;

        let mut deleted = 0;
        let walked = idb::for_each_cursor(&store, |cursor| {
            let object = js_to_record(&cursor.value()?)?;
            if filter(&object) {
                cursor.delete()?;
                deleted += 1;
            }
            Ok(())
        })
        .await;

        if let Err(e) = walked {
            // Nothing from a half-finished sweep may commit.
            let _ = tx.abort();
            return Err(e.into());
        }
        idb::await_transaction(&tx).await?;
        debug!("{} IndexedDB deleted {} records", DB, deleted);

        Ok(deleted)
    }

    async fn count(&self) -> StoreResult<usize> {
        let (tx, store) = self.transaction(IdbTransactionMode::Readonly)?;

        let req = store
            .count()
            .map_err(|e| StoreError::Backend(format!("IDB count: {}", describe(&e))))?;
        let result = idb::await_request(&req).await?;
        idb::await_transaction(&tx).await?;

        Ok(result.as_f64().unwrap_or(0.0) as usize)
    }
}

// ============================================================================
// JS ↔ Rust conversion helpers
// ============================================================================

/// Convert a record to a plain JS object via JSON.
fn record_to_js(object: &StoredObject) -> Result<JsValue, IndexedDbError> {
    let json = serde_json::to_string(object)?;
    js_sys::JSON::parse(&json).map_err(|e| IndexedDbError::JsValue(describe(&e)))
}

/// Convert a stored JS value back into a record.
///
/// Values that JSON cannot represent (dates, blobs, typed arrays) do not
/// survive this conversion. Records written through this backend come back
/// equal under [`offdex_core::json_eq`]; an integral float such as `5.0`
/// reads back as the integer `5`.
fn js_to_record(value: &JsValue) -> Result<StoredObject, IndexedDbError> {
    let json: String = js_sys::JSON::stringify(value)
        .map_err(|e| IndexedDbError::JsValue(describe(&e)))?
        .into();
    match serde_json::from_str(&json)? {
        serde_json::Value::Object(object) => Ok(object),
        other => Err(IndexedDbError::JsValue(format!(
            "stored value is not an object: {}",
            other
        ))),
    }
}
