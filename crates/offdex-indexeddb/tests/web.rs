//! Browser tests for the IndexedDB backend.
//!
//! Run with `wasm-pack test --headless --chrome crates/offdex-indexeddb`.

#![cfg(target_arch = "wasm32")]

use offdex_core::{
    json_eq, record, Backend, Mutation, ObjectStore, StorageQuery, StoreConfig, StoreError,
    StoredObject,
};
use offdex_indexeddb::IndexedDbBackend;
use serde_json::json;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

/// Open a store in a fresh database so tests do not see each other's data.
async fn fresh(name: &str) -> ObjectStore<IndexedDbBackend> {
    IndexedDbBackend::delete_database(name).await.unwrap();
    ObjectStore::open(StoreConfig::new().database(name))
        .await
        .unwrap()
}

fn obj(value: serde_json::Value) -> StoredObject {
    record(value).unwrap()
}

#[wasm_bindgen_test]
async fn test_put_get_delete() {
    let store = fresh("offdex-test-crud").await;

    store
        .put(&obj(json!({"key": "n1", "title": "hello", "tags": ["a"]})))
        .await
        .unwrap();
    let stored = store.get_raw("n1").await.unwrap().unwrap();
    assert_eq!(stored["title"], json!("hello"));
    assert_eq!(stored["tags"], json!(["a"]));

    store.delete("n1").await.unwrap();
    assert!(store.get_raw("n1").await.unwrap().is_none());

    // Deleting again is not an error.
    store.delete("n1").await.unwrap();
}

#[wasm_bindgen_test]
async fn test_integral_floats_round_trip() {
    let store = fresh("offdex-test-floats").await;
    let object = obj(json!({"key": "f", "x": 5.0, "pos": [1.0, 2.5]}));
    store.put(&object).await.unwrap();

    let stored = store.get_raw("f").await.unwrap().unwrap();
    assert!(json_eq(&stored.clone().into(), &object.clone().into()));

    let hits = store
        .get_all_matches_raw(&StorageQuery::new().field("x", 5.0))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
}

#[wasm_bindgen_test]
async fn test_put_replaces_whole_record() {
    let store = fresh("offdex-test-replace").await;

    store.put(&obj(json!({"key": "a", "x": 1}))).await.unwrap();
    store.put(&obj(json!({"key": "a", "y": 2}))).await.unwrap();

    let stored = store.get_raw("a").await.unwrap().unwrap();
    assert!(!stored.contains_key("x"));
    assert_eq!(stored["y"], json!(2));
    assert_eq!(store.count().await.unwrap(), 1);
}

#[wasm_bindgen_test]
async fn test_queries_walk_the_cursor_in_key_order() {
    let store = fresh("offdex-test-query").await;
    store
        .put_all(&[
            obj(json!({"key": "c", "kind": "note"})),
            obj(json!({"key": "a", "kind": "note"})),
            obj(json!({"key": "b", "kind": "task"})),
        ])
        .await
        .unwrap();

    let notes = store
        .get_all_matches(&StorageQuery::new().field("kind", "note"))
        .await
        .unwrap();
    let keys: Vec<&str> = notes.iter().map(|live| live.key()).collect();
    assert_eq!(keys, vec!["a", "c"]);

    let deleted = store
        .delete_all_matches(&StorageQuery::new().field("kind", "note"))
        .await
        .unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[wasm_bindgen_test]
async fn test_live_object_writes_back() {
    let store = fresh("offdex-test-live").await;
    store.put(&obj(json!({"key": "a", "count": 1}))).await.unwrap();

    let mut live = store.get("a").await.unwrap().unwrap();
    assert_eq!(live.set("count", 2).await.unwrap(), Mutation::Applied);
    assert_eq!(live.remove("missing").await.unwrap(), Mutation::Applied);

    let stored = store.get_raw("a").await.unwrap().unwrap();
    assert_eq!(stored["count"], json!(2));
}

#[wasm_bindgen_test]
async fn test_legacy_layout_keys_by_id() {
    let name = "offdex-test-legacy";
    IndexedDbBackend::delete_database(name).await.unwrap();
    let store: ObjectStore<IndexedDbBackend> =
        ObjectStore::open(StoreConfig::legacy().database(name))
            .await
            .unwrap();

    store.put(&obj(json!({"id": "x1", "n": 1}))).await.unwrap();
    assert!(store.get_raw("x1").await.unwrap().is_some());
    assert!(matches!(
        store.put(&obj(json!({"key": "x2"}))).await,
        Err(StoreError::InvalidRecord(_))
    ));
}

#[wasm_bindgen_test]
async fn test_data_survives_reopen() {
    let name = "offdex-test-reopen";
    let store = fresh(name).await;
    store.put(&obj(json!({"key": "kept"}))).await.unwrap();
    store.backend().close();

    let backend = IndexedDbBackend::open(&StoreConfig::new().database(name))
        .await
        .unwrap();
    assert!(backend.get("kept").await.unwrap().is_some());
    backend.close();
}

#[wasm_bindgen_test]
async fn test_open_rejects_mismatched_key_path() {
    let name = "offdex-test-keypath";
    IndexedDbBackend::delete_database(name).await.unwrap();

    let legacy = IndexedDbBackend::open(&StoreConfig::legacy().database(name))
        .await
        .unwrap();
    legacy.close();

    let result = IndexedDbBackend::open(&StoreConfig::new().database(name)).await;
    match result {
        Err(StoreError::Open(msg)) => assert!(msg.contains("keyed by 'id'")),
        other => panic!("expected open failure, got {:?}", other.map(|_| ())),
    }

    // The id-keyed layout still opens.
    let reopened = IndexedDbBackend::open(&StoreConfig::legacy().database(name))
        .await
        .unwrap();
    reopened.close();
}
