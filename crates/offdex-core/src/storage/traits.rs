//! Storage trait definitions

use crate::config::StoreConfig;
use crate::record::StoredObject;
use crate::storage::error::StoreResult;

/// Record filter handed to the backend during a cursor scan.
pub type ScanFilter<'a> = &'a dyn Fn(&StoredObject) -> bool;

/// Minimal interface of an embedded, transactional key-value engine.
///
/// Every method runs in its own transaction and resolves once that
/// transaction has committed. Backends are expected to be used from a single
/// thread of cooperative tasks (the browser event loop, or a current-thread
/// runtime natively), so the returned futures carry no `Send` bound.
#[allow(async_fn_in_trait)]
pub trait Backend: Sized {
    /// Open the database described by `config`, creating the object store
    /// keyed by `config.key_field` if it does not already exist.
    async fn open(config: &StoreConfig) -> StoreResult<Self>;

    /// Fetch a record by key. Returns `None` if absent.
    async fn get(&self, key: &str) -> StoreResult<Option<StoredObject>>;

    /// Insert or replace a record.
    async fn put(&self, object: &StoredObject) -> StoreResult<()>;

    /// Insert or replace many records in a single write transaction.
    ///
    /// Either every record is written or none is.
    async fn put_all(&self, objects: &[StoredObject]) -> StoreResult<()>;

    /// Remove a record by key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Walk every record with a forward cursor, in backend key order,
    /// collecting those accepted by `filter`.
    async fn scan(&self, filter: ScanFilter<'_>) -> StoreResult<Vec<StoredObject>>;

    /// Walk every record with a forward cursor inside one write transaction,
    /// deleting those accepted by `filter`. Returns how many were deleted.
    async fn delete_where(&self, filter: ScanFilter<'_>) -> StoreResult<usize>;

    /// Count stored records.
    async fn count(&self) -> StoreResult<usize> {
        Ok(self.scan(&|_| true).await?.len())
    }
}
