//! offdex core
//!
//! Persistence convenience layer for JSON-like objects keyed by a single
//! identifier field, plus a small reactive layer for values held in memory.
//! Designed to run identically in the browser (WASM, IndexedDB backend from
//! `offdex-indexeddb`) and natively (in-memory backend).
//!
//! # Features
//!
//! - `subscriber` - `logging::init()` installs a tracing-subscriber registry
//! - `wasm` - WASM-compatible build (disable default features alongside it)
//!
//! # Example
//!
//! ```rust
//! use offdex_core::{MemoryBackend, Mutation, ObjectStore, StorageQuery, StoreConfig};
//! use serde_json::json;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let store: ObjectStore<MemoryBackend> = ObjectStore::open(StoreConfig::default()).await?;
//!
//! store.put(&offdex_core::record(json!({"key": "a", "count": 1}))?).await?;
//! store.put(&offdex_core::record(json!({"key": "b", "count": 2}))?).await?;
//!
//! let matches = store
//!     .get_all_matches(&StorageQuery::new().field("count", 2))
//!     .await?;
//! assert_eq!(matches.len(), 1);
//! assert_eq!(matches[0].key(), "b");
//!
//! let mut live = store.get("a").await?.unwrap();
//! assert_eq!(live.set("count", json!(5)).await?, Mutation::Applied);
//! assert_eq!(store.get_raw("a").await?.unwrap()["count"], json!(5));
//! # Ok::<(), offdex_core::StoreError>(())
//! # }).unwrap();
//! ```

pub mod config;
#[cfg(feature = "subscriber")]
pub mod logging;
pub mod observable;
pub mod query;
pub mod record;
pub mod storage;
pub mod store;

// Re-export main types at crate root
pub use config::StoreConfig;
pub use observable::{
    EventKind, ObservableObject, ObservableValue, ObserveError, SameValue, Subscription,
};
pub use query::{Predicate, StorageQuery};
pub use record::{json_eq, key_of, record, StoredObject};
pub use storage::{Backend, MemoryBackend, ScanFilter, StoreError, StoreResult};
pub use store::{LiveObject, Mutation, MutationHooks, ObjectStore};

/// Log segment prefix for database operations. Backend crates prefix their
/// log lines with it too so storage logs group together.
pub const DB: &str = "⊔";
