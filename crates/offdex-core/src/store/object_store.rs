//! Object store facade over a storage backend

use tracing::{debug, trace, warn};

use super::{LiveObject, MutationHooks};
use crate::config::StoreConfig;
use crate::query::Predicate;
use crate::record::{key_of, StoredObject};
use crate::storage::{Backend, StoreResult};
use crate::DB;

/// Persistence facade: CRUD by key plus linear-scan queries.
///
/// The connection is opened once in [`open`](Self::open) and shared by every
/// operation. Reads hand back [`LiveObject`]s that persist their own
/// mutations; use [`get_raw`](Self::get_raw) for a plain copy.
#[derive(Debug)]
pub struct ObjectStore<B> {
    backend: B,
    config: StoreConfig,
}

impl<B: Backend> ObjectStore<B> {
    /// Open (or create) the database and object store described by `config`.
    pub async fn open(config: StoreConfig) -> StoreResult<Self> {
        debug!(
            "{} opening {}/{} keyed by '{}'",
            DB, config.database, config.store, config.key_field
        );
        let backend = B::open(&config).await.map_err(|e| {
            warn!("{} open {} failed: {}", DB, config.database, e);
            e
        })?;
        Ok(Self { backend, config })
    }

    /// Wrap an already opened backend.
    pub fn with_backend(backend: B, config: StoreConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Insert or replace `object` by its key field.
    pub async fn put(&self, object: &StoredObject) -> StoreResult<()> {
        let key = key_of(object, &self.config.key_field)?;
        trace!("{} put {}", DB, key);
        self.backend.put(object).await
    }

    /// Insert or replace many records in one write transaction.
    ///
    /// Every record is validated first; one bad record fails the whole batch
    /// without writing anything.
    pub async fn put_all(&self, objects: &[StoredObject]) -> StoreResult<()> {
        for object in objects {
            key_of(object, &self.config.key_field)?;
        }
        debug!("{} put_all {} records", DB, objects.len());
        self.backend.put_all(objects).await
    }

    /// Fetch `key` as a [`LiveObject`], or `None` if absent.
    pub async fn get(&self, key: &str) -> StoreResult<Option<LiveObject<'_, B>>> {
        self.get_with(key, MutationHooks::default()).await
    }

    /// Like [`get`](Self::get), consulting `hooks` before every mutation.
    pub async fn get_with(
        &self,
        key: &str,
        hooks: MutationHooks,
    ) -> StoreResult<Option<LiveObject<'_, B>>> {
        Ok(self
            .get_raw(key)
            .await?
            .map(|object| LiveObject::new(self, key.to_string(), object, hooks)))
    }

    /// Fetch a plain copy of `key`, or `None` if absent.
    pub async fn get_raw(&self, key: &str) -> StoreResult<Option<StoredObject>> {
        trace!("{} get {}", DB, key);
        self.backend.get(key).await
    }

    /// Remove `key`. Removing an absent key is not an error.
    pub async fn delete(&self, key: &str) -> StoreResult<()> {
        trace!("{} delete {}", DB, key);
        self.backend.delete(key).await
    }

    /// Scan every record and return those matching `predicate`, in backend
    /// key order, each as an independent [`LiveObject`].
    pub async fn get_all_matches<P>(&self, predicate: &P) -> StoreResult<Vec<LiveObject<'_, B>>>
    where
        P: Predicate + ?Sized,
    {
        self.get_all_matches_with(predicate, MutationHooks::default())
            .await
    }

    /// Like [`get_all_matches`](Self::get_all_matches); every returned
    /// object shares `hooks`.
    pub async fn get_all_matches_with<P>(
        &self,
        predicate: &P,
        hooks: MutationHooks,
    ) -> StoreResult<Vec<LiveObject<'_, B>>>
    where
        P: Predicate + ?Sized,
    {
        self.get_all_matches_raw(predicate)
            .await?
            .into_iter()
            .map(|object| {
                let key = key_of(&object, &self.config.key_field)?.to_string();
                Ok(LiveObject::new(self, key, object, hooks.clone()))
            })
            .collect()
    }

    /// Scan every record and return plain copies of those matching
    /// `predicate`, in backend key order.
    pub async fn get_all_matches_raw<P>(&self, predicate: &P) -> StoreResult<Vec<StoredObject>>
    where
        P: Predicate + ?Sized,
    {
        let matches = self
            .backend
            .scan(&|object| predicate.matches(object))
            .await?;
        debug!("{} scan matched {} records", DB, matches.len());
        Ok(matches)
    }

    /// Delete every record matching `predicate` in one write transaction.
    /// Returns the number of records deleted.
    pub async fn delete_all_matches<P>(&self, predicate: &P) -> StoreResult<usize>
    where
        P: Predicate + ?Sized,
    {
        let deleted = self
            .backend
            .delete_where(&|object| predicate.matches(object))
            .await?;
        debug!("{} deleted {} matching records", DB, deleted);
        Ok(deleted)
    }

    /// Number of stored records.
    pub async fn count(&self) -> StoreResult<usize> {
        self.backend.count().await
    }
}
