//! CRUD operation tests for ObjectStore over the in-memory backend

use offdex_core::{record, MemoryBackend, ObjectStore, StoreConfig, StoredObject};
use pretty_assertions::assert_eq;
use serde_json::json;

/// Helper to create a test record
fn create_test_object(key: &str, count: i64) -> StoredObject {
    record(json!({
        "key": key,
        "count": count,
        "title": format!("note {}", key),
        "tags": ["inbox"],
    }))
    .unwrap()
}

async fn open_store() -> ObjectStore<MemoryBackend> {
    offdex_core::logging::init_with_filter("offdex_core=trace");
    ObjectStore::open(StoreConfig::default()).await.unwrap()
}

#[tokio::test]
async fn test_put_and_get() {
    let store = open_store().await;
    let object = create_test_object("a", 1);

    store.put(&object).await.unwrap();

    let retrieved = store.get("a").await.unwrap();
    assert!(retrieved.is_some());
    assert_eq!(retrieved.unwrap().into_record(), object);
}

#[tokio::test]
async fn test_get_nonexistent() {
    let store = open_store().await;
    assert!(store.get("missing").await.unwrap().is_none());
    assert!(store.get_raw("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_put_is_upsert() {
    let store = open_store().await;
    store.put(&create_test_object("a", 1)).await.unwrap();
    store.put(&create_test_object("a", 2)).await.unwrap();

    assert_eq!(store.count().await.unwrap(), 1);
    let retrieved = store.get_raw("a").await.unwrap().unwrap();
    assert_eq!(retrieved["count"], json!(2));
}

#[tokio::test]
async fn test_delete() {
    let store = open_store().await;
    store.put(&create_test_object("a", 1)).await.unwrap();

    store.delete("a").await.unwrap();
    assert!(store.get("a").await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_nonexistent() {
    let store = open_store().await;
    store.delete("missing").await.unwrap();
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_put_all() {
    let store = open_store().await;
    let objects: Vec<StoredObject> = (1..=3)
        .map(|i| create_test_object(&format!("k{}", i), i))
        .collect();

    store.put_all(&objects).await.unwrap();

    assert_eq!(store.count().await.unwrap(), 3);
    for object in &objects {
        let key = object["key"].as_str().unwrap();
        assert_eq!(&store.get_raw(key).await.unwrap().unwrap(), object);
    }
}

#[tokio::test]
async fn test_put_all_empty() {
    let store = open_store().await;
    store.put_all(&[]).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_stores_share_backend() {
    let backend = MemoryBackend::new("key");
    let writer = ObjectStore::with_backend(backend.clone(), StoreConfig::default());
    let reader = ObjectStore::with_backend(backend, StoreConfig::default());

    writer.put(&create_test_object("a", 1)).await.unwrap();
    assert!(reader.get("a").await.unwrap().is_some());
}

#[test]
fn test_db_log_prefix_is_exported() {
    // Backend crates prefix their log lines with the same glyph.
    assert_eq!(offdex_core::DB, "⊔");
}
