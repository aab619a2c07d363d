//! IndexedDB storage backend for offdex object stores (browser WASM)
//!
//! Provides [`IndexedDbBackend`], an implementation of the
//! [`offdex_core::Backend`] trait on top of the browser's IndexedDB, so an
//! `ObjectStore<IndexedDbBackend>` persists across page loads.
//!
//! # Schema
//!
//! One database (default `"offdex"`) holding one object store (default
//! `"objects"`) whose in-line keyPath is the configured key field (default
//! `"key"`, `"id"` for the legacy layout). Records are stored as plain JS
//! objects. There are no secondary indexes; queries walk a cursor over the
//! whole store.
//!
//! # Example
//!
//! ```rust,ignore
//! use offdex_core::{ObjectStore, StorageQuery, StoreConfig};
//! use offdex_indexeddb::IndexedDbBackend;
//! use serde_json::json;
//!
//! let store: ObjectStore<IndexedDbBackend> = ObjectStore::open(StoreConfig::default()).await?;
//!
//! store.put(&offdex_core::record(json!({"key": "n1", "kind": "note"}))?).await?;
//! let notes = store
//!     .get_all_matches(&StorageQuery::new().field("kind", "note"))
//!     .await?;
//! assert_eq!(notes.len(), 1);
//! ```

pub mod error;
pub mod idb;
pub mod store;

pub use error::{IndexedDbError, Result};
pub use store::IndexedDbBackend;
