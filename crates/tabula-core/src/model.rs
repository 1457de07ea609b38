//! Relational data model
//!
//! A [`DatabaseSet`] is the unit of persistence: it is loaded and saved
//! wholesale, and a deep clone of it is a snapshot.

use crate::id::{ColumnId, DatabaseId, EntityId, IdSequence, RowId, TableId};
use crate::value::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Normalized runtime kind a declared SQL type maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseType {
    Number,
    Text,
    Boolean,
    Date,
    DateTime,
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseType::Number => write!(f, "number"),
            BaseType::Text => write!(f, "text"),
            BaseType::Boolean => write!(f, "boolean"),
            BaseType::Date => write!(f, "date"),
            BaseType::DateTime => write!(f, "datetime"),
        }
    }
}

/// A parsed SQL type declaration such as `DECIMAL(10,2)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlType {
    /// Type text as written
    pub original: String,
    pub base_type: BaseType,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
}

/// A column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub name: String,
    pub base_type: BaseType,
    pub original_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    #[serde(default)]
    pub is_primary_key: bool,
}

/// Column metadata returned with query results
pub type ColumnMeta = Column;

impl Column {
    /// Build a column from a parsed type
    pub fn new(id: ColumnId, name: impl Into<String>, sql_type: &SqlType, is_primary_key: bool) -> Self {
        Self {
            id,
            name: name.into(),
            base_type: sql_type.base_type,
            original_type: sql_type.original.clone(),
            length: sql_type.length,
            precision: sql_type.precision,
            scale: sql_type.scale,
            is_primary_key,
        }
    }

    /// Case-insensitive name match
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// A row: cell values keyed by column id
///
/// Cells for columns that were never populated are simply absent and read
/// back as [`Value::Null`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    #[serde(default)]
    pub cells: BTreeMap<ColumnId, Value>,
}

static NULL: Value = Value::Null;

impl Row {
    /// Create an empty row
    pub fn new(id: RowId) -> Self {
        Self {
            id,
            cells: BTreeMap::new(),
        }
    }

    /// Read a cell, yielding null for missing cells
    pub fn get(&self, column: ColumnId) -> &Value {
        self.cells.get(&column).unwrap_or(&NULL)
    }

    /// Set a cell value
    pub fn set(&mut self, column: ColumnId, value: Value) {
        self.cells.insert(column, value);
    }

    /// Drop a cell
    pub fn remove(&mut self, column: ColumnId) -> Option<Value> {
        self.cells.remove(&column)
    }
}

/// A table with its columns and rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    #[serde(default)]
    ids: IdSequence,
}

impl Table {
    /// Create an empty table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TableId::new(),
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
            ids: IdSequence::new(),
        }
    }

    /// Case-insensitive name match
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Append a column, allocating a fresh id
    pub fn add_column(&mut self, name: impl Into<String>, sql_type: &SqlType, is_primary_key: bool) -> ColumnId {
        let id = self.ids.next_column_id();
        self.columns.push(Column::new(id, name, sql_type, is_primary_key));
        id
    }

    /// Remove a column and every cell stored under it
    pub fn remove_column(&mut self, id: ColumnId) -> Option<Column> {
        let pos = self.columns.iter().position(|c| c.id == id)?;
        for row in &mut self.rows {
            row.remove(id);
        }
        Some(self.columns.remove(pos))
    }

    /// Find a column by name (case-insensitive)
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.is_named(name))
    }

    /// Find a column by name for mutation (case-insensitive)
    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.is_named(name))
    }

    /// Find a column by id
    pub fn column_by_id(&self, id: ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// Append a row with the given cells, returning its new id
    pub fn insert_row(&mut self, cells: BTreeMap<ColumnId, Value>) -> RowId {
        let id = self.ids.next_row_id();
        self.rows.push(Row { id, cells });
        id
    }

    /// Find a row by id
    pub fn row(&self, id: RowId) -> Option<&Row> {
        self.rows.iter().find(|r| r.id == id)
    }

    /// Find a row by id for mutation
    pub fn row_mut(&mut self, id: RowId) -> Option<&mut Row> {
        self.rows.iter_mut().find(|r| r.id == id)
    }

    /// Remove every row whose id is listed, returning how many were removed
    pub fn remove_rows(&mut self, ids: &[RowId]) -> usize {
        let before = self.rows.len();
        self.rows.retain(|r| !ids.contains(&r.id));
        before - self.rows.len()
    }

    /// Peek at the id sequence
    pub fn id_sequence(&self) -> &IdSequence {
        &self.ids
    }
}

/// Whether a permission event granted or revoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GrantAction {
    Grant,
    Revoke,
}

/// What kind of object a permission event names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PermissionScope {
    Table,
    Database,
}

impl fmt::Display for GrantAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantAction::Grant => write!(f, "GRANT"),
            GrantAction::Revoke => write!(f, "REVOKE"),
        }
    }
}

impl fmt::Display for PermissionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionScope::Table => write!(f, "TABLE"),
            PermissionScope::Database => write!(f, "DATABASE"),
        }
    }
}

/// An audit-log entry for GRANT / REVOKE
///
/// Recorded only. Nothing consults these entries when executing statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionEvent {
    pub action: GrantAction,
    pub privilege: String,
    pub scope: PermissionScope,
    pub name: String,
    pub user: String,
    pub timestamp: DateTime<Utc>,
}

/// Per-database metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseMeta {
    #[serde(default)]
    pub permissions: Vec<PermissionEvent>,
}

/// A named database holding tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub id: DatabaseId,
    pub name: String,
    pub tables: Vec<Table>,
    #[serde(default)]
    pub meta: DatabaseMeta,
}

impl Database {
    /// Create an empty database
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: DatabaseId::new(),
            name: name.into(),
            tables: Vec::new(),
            meta: DatabaseMeta::default(),
        }
    }

    /// Find a table by name (case-insensitive)
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.is_named(name))
    }

    /// Find a table by name for mutation (case-insensitive)
    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.is_named(name))
    }

    /// Check whether a table name is taken (case-insensitive)
    pub fn has_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    /// Remove a table by name, returning it
    pub fn remove_table(&mut self, name: &str) -> Option<Table> {
        let pos = self.tables.iter().position(|t| t.is_named(name))?;
        Some(self.tables.remove(pos))
    }
}

/// The full persisted collection of databases
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatabaseSet {
    databases: Vec<Database>,
}

impl DatabaseSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of databases
    pub fn len(&self) -> usize {
        self.databases.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    /// Iterate in creation order
    pub fn iter(&self) -> impl Iterator<Item = &Database> {
        self.databases.iter()
    }

    /// Look up by id
    pub fn get(&self, id: DatabaseId) -> Option<&Database> {
        self.databases.iter().find(|d| d.id == id)
    }

    /// Look up by id for mutation
    pub fn get_mut(&mut self, id: DatabaseId) -> Option<&mut Database> {
        self.databases.iter_mut().find(|d| d.id == id)
    }

    /// Check whether an id is present
    pub fn contains(&self, id: DatabaseId) -> bool {
        self.get(id).is_some()
    }

    /// Look up by name (case-insensitive)
    pub fn find_by_name(&self, name: &str) -> Option<&Database> {
        self.databases
            .iter()
            .find(|d| d.name == name)
            .or_else(|| self.databases.iter().find(|d| d.name.eq_ignore_ascii_case(name)))
    }

    /// Append a database
    pub fn push(&mut self, database: Database) {
        self.databases.push(database);
    }

    /// Remove a database by id, returning it
    pub fn remove(&mut self, id: DatabaseId) -> Option<Database> {
        let pos = self.databases.iter().position(|d| d.id == id)?;
        Some(self.databases.remove(pos))
    }
}

impl FromIterator<Database> for DatabaseSet {
    fn from_iter<I: IntoIterator<Item = Database>>(iter: I) -> Self {
        Self {
            databases: iter.into_iter().collect(),
        }
    }
}
