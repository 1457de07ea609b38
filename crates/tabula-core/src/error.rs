//! Error types for Tabula
//!
//! Every statement failure surfaces as one of these kinds. Coercion never
//! produces an error; it degrades to a default value instead.

use thiserror::Error;

/// The main error type for Tabula operations
#[derive(Error, Debug)]
pub enum Error {
    // ========== Statement Errors ==========
    #[error("Empty statement")]
    EmptyStatement,

    #[error("Invalid syntax: {0}")]
    InvalidSyntax(String),

    #[error("Unsupported statement '{statement}'. Supported: {supported}")]
    UnsupportedStatement { statement: String, supported: String },

    #[error("Invalid condition: {0}")]
    InvalidCondition(String),

    // ========== Schema Errors ==========
    #[error("Database not found: {0}")]
    DatabaseNotFound(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Database already exists: {0}")]
    DatabaseAlreadyExists(String),

    #[error("Table already exists: {0}")]
    TableAlreadyExists(String),

    #[error("Duplicate column name: {0}")]
    DuplicateColumnName(String),

    #[error("Invalid column definition: {0}")]
    InvalidColumnDefinition(String),

    #[error("Invalid type: {0}")]
    InvalidType(String),

    #[error("No active database selected")]
    NoActiveDatabase,

    #[error("Row not found: {0}")]
    RowNotFound(u64),

    // ========== Storage Errors ==========
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ========== Configuration Errors ==========
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ========== Internal Errors ==========
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Tabula operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Short, stable name of the error kind for display and logging
    pub fn kind(&self) -> &'static str {
        match self {
            Error::EmptyStatement => "EmptyStatement",
            Error::InvalidSyntax(_) => "InvalidSyntax",
            Error::UnsupportedStatement { .. } => "UnsupportedStatement",
            Error::InvalidCondition(_) => "InvalidCondition",
            Error::DatabaseNotFound(_) => "DatabaseNotFound",
            Error::TableNotFound(_) => "TableNotFound",
            Error::ColumnNotFound(_) => "ColumnNotFound",
            Error::DatabaseAlreadyExists(_) => "DatabaseAlreadyExists",
            Error::TableAlreadyExists(_) => "TableAlreadyExists",
            Error::DuplicateColumnName(_) => "DuplicateColumnName",
            Error::InvalidColumnDefinition(_) => "InvalidColumnDefinition",
            Error::InvalidType(_) => "InvalidType",
            Error::NoActiveDatabase => "NoActiveDatabase",
            Error::RowNotFound(_) => "RowNotFound",
            Error::Storage(_) => "Storage",
            Error::Serialization(_) => "Serialization",
            Error::Deserialization(_) => "Deserialization",
            Error::Io(_) => "Io",
            Error::Configuration(_) => "Configuration",
            Error::Internal(_) => "Internal",
        }
    }

    /// Returns true if the statement text itself was rejected
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            Error::EmptyStatement
                | Error::InvalidSyntax(_)
                | Error::UnsupportedStatement { .. }
                | Error::InvalidCondition(_)
        )
    }

    /// Returns true if a referenced schema object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::DatabaseNotFound(_)
                | Error::TableNotFound(_)
                | Error::ColumnNotFound(_)
                | Error::RowNotFound(_)
        )
    }

    /// Returns true if the failure came from the persistence layer
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::Storage(_) | Error::Serialization(_) | Error::Deserialization(_) | Error::Io(_)
        )
    }
}
