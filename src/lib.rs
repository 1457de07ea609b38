//! Tabula - embedded SQL-like statement interpreter
//!
//! This is the main library crate that re-exports all Tabula components.

pub use tabula_core as core;
pub use tabula_query as query;
pub use tabula_shell as shell;
pub use tabula_storage as storage;

// Re-export commonly used types
pub use tabula_core::{
    BaseType, Column, ColumnId, Database, DatabaseId, DatabaseSet, EntityId, Error, Result, Row,
    RowId, Table, Value,
};

pub use tabula_query::{
    DataChange, DataChangeListener, Interpreter, InterpreterOptions, QueryResult, Session,
    TransactionMode,
};
pub use tabula_storage::{
    JsonFileStore, JsonSnapshotStack, MemorySnapshotStack, MemoryStore, SnapshotStack,
    StorageOptions, Store,
};
