//! Storage abstraction for stored objects
//!
//! This module defines the `Backend` trait that abstracts over embedded
//! key-value engines. Implementations exist for:
//!
//! - **Memory**: in-memory storage for tests and native use (`MemoryBackend`)
//! - **IndexedDB**: browser storage via web-sys (`offdex-indexeddb`, WASM only)
//!
//! # Example
//!
//! ```rust
//! use offdex_core::storage::{Backend, MemoryBackend};
//! use serde_json::json;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let backend = MemoryBackend::new("key");
//! backend.put(&offdex_core::record(json!({"key": "a"})).unwrap()).await.unwrap();
//! assert!(backend.get("a").await.unwrap().is_some());
//! # });
//! ```

mod error;
mod memory;
mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryBackend;
pub use traits::{Backend, ScanFilter};
