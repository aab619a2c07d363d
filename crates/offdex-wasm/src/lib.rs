//! offdex WASM bridge
//!
//! Exposes the object store to JavaScript. Records, queries and
//! configuration cross the boundary as JSON text; the [`json`] module holds
//! the parsing rules and is usable (and tested) natively.
//!
//! The `browser` feature adds the `wasm-bindgen` surface in `browser`, backed
//! by one IndexedDB store per WASM instance.

pub mod json;

#[cfg(feature = "browser")]
pub mod browser;
