//! Records that persist their own mutations

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::ObjectStore;
use crate::record::StoredObject;
use crate::storage::{Backend, StoreError, StoreResult};
use crate::DB;

type SetHook = Arc<dyn Fn(&str, Option<&Value>, &Value) -> bool + Send + Sync>;
type DeleteHook = Arc<dyn Fn(&str, Option<&Value>) -> bool + Send + Sync>;

/// Interception callbacks consulted before a [`LiveObject`] mutation.
///
/// A hook returning `false` vetoes the mutation; `true` lets it through.
/// Cloning is cheap and shares the callbacks.
#[derive(Clone, Default)]
pub struct MutationHooks {
    on_set: Option<SetHook>,
    on_delete: Option<DeleteHook>,
}

impl MutationHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called as `on_set(field, old_value, new_value)` before an assignment.
    /// `old_value` is `None` when the field does not exist yet.
    pub fn on_set<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, Option<&Value>, &Value) -> bool + Send + Sync + 'static,
    {
        self.on_set = Some(Arc::new(hook));
        self
    }

    /// Called as `on_delete(field, deleted_value)` before a removal.
    pub fn on_delete<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, Option<&Value>) -> bool + Send + Sync + 'static,
    {
        self.on_delete = Some(Arc::new(hook));
        self
    }

    fn allow_set(&self, field: &str, old: Option<&Value>, new: &Value) -> bool {
        self.on_set.as_ref().map_or(true, |hook| hook(field, old, new))
    }

    fn allow_delete(&self, field: &str, old: Option<&Value>) -> bool {
        self.on_delete.as_ref().map_or(true, |hook| hook(field, old))
    }
}

impl fmt::Debug for MutationHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationHooks")
            .field("on_set", &self.on_set.is_some())
            .field("on_delete", &self.on_delete.is_some())
            .finish()
    }
}

/// Outcome of a [`LiveObject`] mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Applied in memory and written back to the store
    Applied,
    /// Rejected by a hook; nothing changed
    Vetoed,
}

/// A fetched record that writes itself back to the store on every mutation.
///
/// Each call to `ObjectStore::get` or `get_all_matches` yields a fresh,
/// independent `LiveObject`; two of them over the same key do not share
/// state, and the last write-back to commit wins for the whole record.
///
/// Mutations resolve only after the write-back has committed. If the write
/// fails, the in-memory change is rolled back and the error returned.
pub struct LiveObject<'s, B> {
    store: &'s ObjectStore<B>,
    key: String,
    object: StoredObject,
    hooks: MutationHooks,
}

impl<'s, B: Backend> LiveObject<'s, B> {
    pub(crate) fn new(
        store: &'s ObjectStore<B>,
        key: String,
        object: StoredObject,
        hooks: MutationHooks,
    ) -> Self {
        Self {
            store,
            key,
            object,
            hooks,
        }
    }

    /// Value of the key field.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.object.get(field)
    }

    /// The record as currently held in memory.
    pub fn record(&self) -> &StoredObject {
        &self.object
    }

    pub fn into_record(self) -> StoredObject {
        self.object
    }

    /// Assign `field`, then persist the whole record.
    ///
    /// The `on_set` hook sees the old and new values first and may veto.
    /// The key field cannot be assigned.
    pub async fn set(&mut self, field: &str, value: impl Into<Value>) -> StoreResult<Mutation> {
        self.ensure_not_key(field)?;
        let value = value.into();

        if !self.hooks.allow_set(field, self.object.get(field), &value) {
            debug!("{} set {}.{} vetoed", DB, self.key, field);
            return Ok(Mutation::Vetoed);
        }

        let previous = self.object.insert(field.to_string(), value);
        if let Err(e) = self.write_back().await {
            match previous {
                Some(old) => self.object.insert(field.to_string(), old),
                None => self.object.remove(field),
            };
            return Err(e);
        }
        Ok(Mutation::Applied)
    }

    /// Remove `field`, then persist the whole record.
    ///
    /// The `on_delete` hook sees the removed value first and may veto.
    /// The key field cannot be removed.
    pub async fn remove(&mut self, field: &str) -> StoreResult<Mutation> {
        self.ensure_not_key(field)?;

        if !self.hooks.allow_delete(field, self.object.get(field)) {
            debug!("{} remove {}.{} vetoed", DB, self.key, field);
            return Ok(Mutation::Vetoed);
        }

        let previous = self.object.remove(field);
        if let Err(e) = self.write_back().await {
            if let Some(old) = previous {
                self.object.insert(field.to_string(), old);
            }
            return Err(e);
        }
        Ok(Mutation::Applied)
    }

    /// Reload the record from the store, discarding the in-memory copy.
    ///
    /// Returns `false` (and keeps the stale copy) if the record has since
    /// been deleted.
    pub async fn refresh(&mut self) -> StoreResult<bool> {
        match self.store.get_raw(&self.key).await? {
            Some(object) => {
                self.object = object;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn ensure_not_key(&self, field: &str) -> StoreResult<()> {
        let key_field = &self.store.config().key_field;
        if field == key_field {
            return Err(StoreError::KeyFieldImmutable(key_field.clone()));
        }
        Ok(())
    }

    async fn write_back(&self) -> StoreResult<()> {
        self.store.put(&self.object).await.map_err(|e| {
            warn!("{} write-back of {} failed: {}", DB, self.key, e);
            e
        })
    }
}

impl<B> fmt::Debug for LiveObject<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveObject")
            .field("key", &self.key)
            .field("object", &self.object)
            .field("hooks", &self.hooks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::record::record;
    use crate::storage::MemoryBackend;
    use serde_json::json;

    async fn seeded() -> ObjectStore<MemoryBackend> {
        let store = ObjectStore::open(StoreConfig::default()).await.unwrap();
        store
            .put(&record(json!({"key": "a", "count": 1, "title": "first"})).unwrap())
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_key_field_is_immutable() {
        let store = seeded().await;
        let mut live = store.get("a").await.unwrap().unwrap();

        let result = live.set("key", "b").await;
        assert_eq!(result, Err(StoreError::KeyFieldImmutable("key".into())));
        assert_eq!(
            live.remove("key").await,
            Err(StoreError::KeyFieldImmutable("key".into()))
        );
        assert!(store.get_raw("b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_new_field_sees_no_old_value() {
        let store = seeded().await;
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let hooks = MutationHooks::new().on_set(move |field, old, new| {
            sink.lock().push((field.to_string(), old.cloned(), new.clone()));
            true
        });

        let mut live = store.get_with("a", hooks).await.unwrap().unwrap();
        live.set("tags", json!(["x"])).await.unwrap();
        live.set("count", 2).await.unwrap();

        assert_eq!(
            *seen.lock(),
            vec![
                ("tags".to_string(), None, json!(["x"])),
                ("count".to_string(), Some(json!(1)), json!(2)),
            ]
        );
    }

    #[tokio::test]
    async fn test_remove_vetoed() {
        let store = seeded().await;
        let hooks = MutationHooks::new().on_delete(|field, _| field != "title");
        let mut live = store.get_with("a", hooks).await.unwrap().unwrap();

        assert_eq!(live.remove("title").await.unwrap(), Mutation::Vetoed);
        assert_eq!(live.get("title"), Some(&json!("first")));

        assert_eq!(live.remove("count").await.unwrap(), Mutation::Applied);
        let stored = store.get_raw("a").await.unwrap().unwrap();
        assert!(!stored.contains_key("count"));
        assert_eq!(stored["title"], json!("first"));
    }

    #[tokio::test]
    async fn test_refresh() {
        let store = seeded().await;
        let mut first = store.get("a").await.unwrap().unwrap();
        let mut second = store.get("a").await.unwrap().unwrap();

        first.set("count", 10).await.unwrap();
        assert_eq!(second.get("count"), Some(&json!(1)));

        assert!(second.refresh().await.unwrap());
        assert_eq!(second.get("count"), Some(&json!(10)));

        store.delete("a").await.unwrap();
        assert!(!second.refresh().await.unwrap());
        assert_eq!(second.get("count"), Some(&json!(10)));
    }
}
