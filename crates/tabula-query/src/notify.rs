//! Data change notifications
//!
//! Listeners hear about every successful mutation after it has been
//! persisted. They get a copy of the affected database as it stands
//! afterwards; for a dropped database that is its final state.

use serde::{Deserialize, Serialize};
use std::fmt;
use tabula_core::Database;

/// What a mutation touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataChange {
    DatabaseCreated,
    DatabaseDropped,
    TablesChanged,
    RowsChanged,
    PermissionsChanged,
    /// A rollback replaced the collection with a snapshot
    Restored,
}

impl fmt::Display for DataChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataChange::DatabaseCreated => "database created",
            DataChange::DatabaseDropped => "database dropped",
            DataChange::TablesChanged => "tables changed",
            DataChange::RowsChanged => "rows changed",
            DataChange::PermissionsChanged => "permissions changed",
            DataChange::Restored => "restored",
        };
        write!(f, "{}", s)
    }
}

/// A pending notification produced by an executor
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeNotice {
    pub database: Database,
    pub change: DataChange,
}

impl ChangeNotice {
    pub fn new(database: Database, change: DataChange) -> Self {
        Self { database, change }
    }
}

/// Receives notifications after successful DDL and DML
pub trait DataChangeListener: Send + Sync {
    fn on_data_changed(&self, database: &Database, change: DataChange);
}

impl<F> DataChangeListener for F
where
    F: Fn(&Database, DataChange) + Send + Sync,
{
    fn on_data_changed(&self, database: &Database, change: DataChange) {
        self(database, change)
    }
}
