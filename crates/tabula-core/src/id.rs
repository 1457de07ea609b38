//! Entity identification types for Tabula
//!
//! Databases and tables get random UUIDs. Columns and rows get numbers drawn
//! from a per-table [`IdSequence`], so an id is never handed out twice even
//! after the entity it named is dropped.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Internal numeric ID for columns and rows
pub type InternalId = u64;

/// Trait for globally unique entity identifiers
pub trait EntityId: Clone + Copy + Eq + std::hash::Hash + fmt::Debug + fmt::Display {
    /// Create a new random ID
    fn new() -> Self;

    /// Create from UUID
    fn from_uuid(uuid: Uuid) -> Self;

    /// Get as UUID
    fn as_uuid(&self) -> Uuid;
}

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl EntityId for $name {
            fn new() -> Self {
                Self(Uuid::new_v4())
            }

            fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(DatabaseId);
uuid_id!(TableId);

/// Identifier for a column, unique within its table
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnId(InternalId);

/// Identifier for a row, unique within its table
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(InternalId);

macro_rules! numeric_id {
    ($name:ident) => {
        impl $name {
            /// Create from internal numeric ID
            pub fn from_internal(id: InternalId) -> Self {
                Self(id)
            }

            /// Get the internal numeric representation
            pub fn as_internal(&self) -> InternalId {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(ColumnId);
numeric_id!(RowId);

/// Sequential id allocator stored alongside a table
///
/// Counters only move forward. They are persisted with the table so a
/// reloaded table keeps allocating past every id it ever issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdSequence {
    next_column_id: InternalId,
    next_row_id: InternalId,
}

impl IdSequence {
    /// Create a new sequence starting at 1
    pub fn new() -> Self {
        Self {
            next_column_id: 1,
            next_row_id: 1,
        }
    }

    /// Create with starting values (for recovery)
    pub fn with_start(column_start: InternalId, row_start: InternalId) -> Self {
        Self {
            next_column_id: column_start,
            next_row_id: row_start,
        }
    }

    /// Allocate the next column ID
    pub fn next_column_id(&mut self) -> ColumnId {
        let id = self.next_column_id;
        self.next_column_id += 1;
        ColumnId(id)
    }

    /// Allocate the next row ID
    pub fn next_row_id(&mut self) -> RowId {
        let id = self.next_row_id;
        self.next_row_id += 1;
        RowId(id)
    }

    /// Peek at the column counter without allocating
    pub fn current_column_id(&self) -> InternalId {
        self.next_column_id
    }

    /// Peek at the row counter without allocating
    pub fn current_row_id(&self) -> InternalId {
        self.next_row_id
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}
