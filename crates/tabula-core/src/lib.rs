//! Tabula Core Library
//!
//! This crate provides the fundamental types and error handling shared by
//! the Tabula storage backends and statement interpreter.
//!
//! # Overview
//!
//! Tabula is an embedded interpreter for a restricted SQL-like language
//! running against an in-memory relational store with snapshot-based
//! transactions.
//!
//! # Modules
//!
//! - `model` - Databases, tables, columns, rows and permission events
//! - `value` - Cell values and their comparison rules
//! - `error` - Error types and result aliases
//! - `id` - Entity identification and generation

pub mod error;
pub mod id;
pub mod model;
pub mod value;

pub use error::{Error, Result};
pub use id::{ColumnId, DatabaseId, EntityId, IdSequence, RowId, TableId};
pub use model::{
    BaseType, Column, ColumnMeta, Database, DatabaseMeta, DatabaseSet, GrantAction,
    PermissionEvent, PermissionScope, Row, SqlType, Table,
};
pub use value::Value;
