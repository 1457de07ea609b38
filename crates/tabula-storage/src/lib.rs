//! Tabula Storage
//!
//! Persistence capabilities for the statement interpreter.
//!
//! # Architecture
//!
//! The interpreter only sees two traits:
//! - [`Store`] - wholesale load/save of the [`DatabaseSet`](tabula_core::DatabaseSet)
//! - [`SnapshotStack`] - push/pop/clear of full-collection snapshots
//!
//! # Backends
//!
//! - `MemoryStore` / `MemorySnapshotStack` - in-process, for tests and embedding
//! - `JsonFileStore` / `JsonSnapshotStack` - JSON documents in a data directory
//! - `RocksStore` - RocksDB, behind the `rocksdb` feature

pub mod file;
pub mod options;
pub mod store;

#[cfg(feature = "rocksdb")]
pub mod engine;
#[cfg(feature = "rocksdb")]
pub mod keys;

#[cfg(feature = "rocksdb")]
pub use engine::RocksStore;
pub use file::{JsonFileStore, JsonSnapshotStack};
pub use options::StorageOptions;
pub use store::{MemorySnapshotStack, MemoryStore, SnapshotStack, Store};
