//! Linear-scan query tests for ObjectStore

use offdex_core::{record, MemoryBackend, ObjectStore, StorageQuery, StoreConfig, StoredObject};
use pretty_assertions::assert_eq;
use serde_json::json;

async fn seeded_store() -> ObjectStore<MemoryBackend> {
    let store = ObjectStore::open(StoreConfig::default()).await.unwrap();
    store
        .put_all(&[
            record(json!({"key": "a", "count": 1})).unwrap(),
            record(json!({"key": "b", "count": 2})).unwrap(),
        ])
        .await
        .unwrap();
    store
}

fn keys(objects: &[StoredObject]) -> Vec<String> {
    objects
        .iter()
        .map(|o| o["key"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_get_all_matches_by_query() {
    let store = seeded_store().await;

    let matches = store
        .get_all_matches(&StorageQuery::new().field("count", 2))
        .await
        .unwrap();

    assert_eq!(matches.len(), 1);
    assert_eq!(
        matches[0].record(),
        &record(json!({"key": "b", "count": 2})).unwrap()
    );
}

#[tokio::test]
async fn test_delete_all_matches_leaves_the_rest() {
    let store = seeded_store().await;

    store
        .delete_all_matches(&StorageQuery::new().field("count", 1))
        .await
        .unwrap();

    assert!(store.get("a").await.unwrap().is_none());
    assert!(store.get("b").await.unwrap().is_some());
}

#[tokio::test]
async fn test_empty_query_matches_all() {
    let store = seeded_store().await;
    let all = store.get_all_matches_raw(&StorageQuery::new()).await.unwrap();
    assert_eq!(keys(&all), vec!["a", "b"]);
}

#[tokio::test]
async fn test_no_matches() {
    let store = seeded_store().await;
    let none = store
        .get_all_matches(&StorageQuery::new().field("count", 3))
        .await
        .unwrap();
    assert!(none.is_empty());

    let deleted = store
        .delete_all_matches(&StorageQuery::new().field("count", 3))
        .await
        .unwrap();
    assert_eq!(deleted, 0);
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_predicate_subset_matches_and_deletes_exactly() {
    let store: ObjectStore<MemoryBackend> =
        ObjectStore::open(StoreConfig::default()).await.unwrap();
    let objects: Vec<StoredObject> = (0..20)
        .map(|i| record(json!({"key": format!("k{:02}", i), "n": i})).unwrap())
        .collect();
    store.put_all(&objects).await.unwrap();

    let divisible_by_three = |o: &StoredObject| o["n"].as_i64().unwrap() % 3 == 0;
    let expected: Vec<String> = keys(
        &objects
            .iter()
            .filter(|o| divisible_by_three(*o))
            .cloned()
            .collect::<Vec<_>>(),
    );

    let matched = store.get_all_matches_raw(&divisible_by_three).await.unwrap();
    assert_eq!(keys(&matched), expected);

    let deleted = store.delete_all_matches(&divisible_by_three).await.unwrap();
    assert_eq!(deleted, expected.len());

    let remaining = store.get_all_matches_raw(&StorageQuery::new()).await.unwrap();
    assert_eq!(remaining.len(), objects.len() - expected.len());
    assert!(remaining.iter().all(|o| !divisible_by_three(o)));
}

#[tokio::test]
async fn test_multi_field_query() {
    let store: ObjectStore<MemoryBackend> =
        ObjectStore::open(StoreConfig::default()).await.unwrap();
    store
        .put_all(&[
            record(json!({"key": "a", "kind": "note", "archived": false})).unwrap(),
            record(json!({"key": "b", "kind": "note", "archived": true})).unwrap(),
            record(json!({"key": "c", "kind": "task", "archived": false})).unwrap(),
        ])
        .await
        .unwrap();

    let query: StorageQuery =
        serde_json::from_value(json!({"kind": "note", "archived": false})).unwrap();
    let matched = store.get_all_matches_raw(&query).await.unwrap();
    assert_eq!(keys(&matched), vec!["a"]);
}
