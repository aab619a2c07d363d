//! Browser WASM bindings using wasm-bindgen and IndexedDB storage
//!
//! Every function returns a Promise on the JS side. Records go in and come
//! out as JSON text; errors reject with a message string.
//!
//! ```js
//! await init_store();                       // or init_store('{"key_field":"id"}')
//! await put_object('{"key":"n1","count":1}');
//! await set_field("n1", "count", "2");
//! const hits = JSON.parse(await get_all_matches('{"count":2}'));
//! ```

use offdex_core::{Mutation, ObjectStore, StoreError};
use offdex_indexeddb::IndexedDbBackend;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;
use wasm_bindgen::prelude::*;

use crate::json;

type Store = ObjectStore<IndexedDbBackend>;

// One store per WASM instance. Rc<RefCell<>> because WASM is single-threaded
// and the handle is shared across async boundaries.
thread_local! {
    static STORE: RefCell<Option<Rc<Store>>> = RefCell::new(None);
}

fn js_error(err: StoreError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Get a clone of the store Rc.
fn get_store() -> Result<Rc<Store>, JsValue> {
    STORE.with(|s| {
        s.borrow()
            .as_ref()
            .cloned()
            .ok_or_else(|| JsValue::from_str("Store not initialized. Call init_store() first."))
    })
}

/// Open the IndexedDB store. Must be called before any storage operation.
///
/// `config_json` may override `database`, `store` and `key_field`; omitted
/// fields keep their defaults (`"offdex"`, `"objects"`, `"key"`).
#[wasm_bindgen]
pub async fn init_store(config_json: Option<String>) -> Result<(), JsValue> {
    // Route Rust panics to console.error instead of "RuntimeError: unreachable"
    console_error_panic_hook::set_once();

    let config = json::parse_config(config_json.as_deref()).map_err(js_error)?;
    let store = Store::open(config).await.map_err(js_error)?;

    // Checked after the open so two racing calls cannot both install a store.
    STORE.with(|s| {
        let mut s = s.borrow_mut();
        if s.is_some() {
            store.backend().close();
            return Err(JsValue::from_str("Store already initialized"));
        }
        debug!("store ready: {:?}", store.config());
        *s = Some(Rc::new(store));
        Ok(())
    })
}

/// Insert or replace one record.
#[wasm_bindgen]
pub async fn put_object(object_json: &str) -> Result<(), JsValue> {
    let object = json::parse_record(object_json).map_err(js_error)?;
    let store = get_store()?;
    store.put(&object).await.map_err(js_error)
}

/// Insert or replace every record of a JSON array in one transaction.
/// Resolves to the number of records written.
#[wasm_bindgen]
pub async fn put_objects(objects_json: &str) -> Result<usize, JsValue> {
    let objects = json::parse_records(objects_json).map_err(js_error)?;
    let store = get_store()?;
    store.put_all(&objects).await.map_err(js_error)?;
    Ok(objects.len())
}

/// Fetch a record by key. Resolves to its JSON, or `undefined` if absent.
#[wasm_bindgen]
pub async fn get_object(key: &str) -> Result<Option<String>, JsValue> {
    let store = get_store()?;
    match store.get_raw(key).await.map_err(js_error)? {
        Some(object) => json::to_json(&object).map(Some).map_err(js_error),
        None => Ok(None),
    }
}

/// Delete a record by key. Deleting an absent key succeeds.
#[wasm_bindgen]
pub async fn delete_object(key: &str) -> Result<(), JsValue> {
    let store = get_store()?;
    store.delete(key).await.map_err(js_error)
}

/// Resolve to a JSON array of every record matching `query_json`.
#[wasm_bindgen]
pub async fn get_all_matches(query_json: &str) -> Result<String, JsValue> {
    let query = json::parse_query(query_json).map_err(js_error)?;
    let store = get_store()?;
    let matches = store.get_all_matches_raw(&query).await.map_err(js_error)?;
    json::to_json(&matches).map_err(js_error)
}

/// Delete every record matching `query_json`. Resolves to the number deleted.
#[wasm_bindgen]
pub async fn delete_all_matches(query_json: &str) -> Result<usize, JsValue> {
    let query = json::parse_query(query_json).map_err(js_error)?;
    let store = get_store()?;
    store.delete_all_matches(&query).await.map_err(js_error)
}

/// Assign one field of a stored record and write it back.
///
/// Resolves to `false` if no record has `key`.
#[wasm_bindgen]
pub async fn set_field(key: &str, field: &str, value_json: &str) -> Result<bool, JsValue> {
    let value = json::parse_value(value_json).map_err(js_error)?;
    let store = get_store()?;
    let Some(mut live) = store.get(key).await.map_err(js_error)? else {
        return Ok(false);
    };
    let outcome = live.set(field, value).await.map_err(js_error)?;
    Ok(outcome == Mutation::Applied)
}

/// Remove one field of a stored record and write it back.
///
/// Resolves to `false` if no record has `key`.
#[wasm_bindgen]
pub async fn remove_field(key: &str, field: &str) -> Result<bool, JsValue> {
    let store = get_store()?;
    let Some(mut live) = store.get(key).await.map_err(js_error)? else {
        return Ok(false);
    };
    let outcome = live.remove(field).await.map_err(js_error)?;
    Ok(outcome == Mutation::Applied)
}

/// Number of stored records.
#[wasm_bindgen]
pub async fn count_objects() -> Result<usize, JsValue> {
    let store = get_store()?;
    store.count().await.map_err(js_error)
}

/// Crate version, for diagnostics.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Check if the store has been initialized.
#[wasm_bindgen]
pub fn is_store_initialized() -> bool {
    STORE.with(|s| s.borrow().is_some())
}
