//! # mica-memory
//!
//! Durable agent memory: markdown notes on disk plus a SQLite-backed
//! lexical index over them. The index prefers FTS5 with BM25 ranking and
//! degrades to a substring scan when the bundled SQLite lacks FTS5.
//!
//! [`MemoryStore`] is the façade the runtime talks to: daily notes,
//! long-term `MEMORY.md`, and query-scoped context assembly.

#![deny(unsafe_code)]

pub mod db;
pub mod errors;
pub mod index;
pub mod store;

pub use errors::MemoryError;
pub use index::{MemoryHit, MemoryIndex, SearchStrategy};
pub use store::MemoryStore;
