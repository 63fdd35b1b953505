//! Store Error Types
//!
//! Error types for document-store operations, covering open, SQL
//! execution, row decoding, and body codec failures. Connection
//! lifecycle errors live in `db::connection`.

use std::path::PathBuf;
use thiserror::Error;

/// Document store operation errors
///
/// Covers all error cases for opening a store and running single
/// operations against it. Service layers wrap these with operation
/// context.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the underlying database
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        source: libsql::Error,
    },

    /// Failed to create the database directory
    #[error("Failed to create database directory: {0}")]
    DirectoryCreationFailed(#[from] std::io::Error),

    /// Collection name failed the identifier charset check
    #[error("Invalid collection name: {name}")]
    InvalidCollection { name: String },

    /// libsql operation error
    #[error("Store operation failed: {0}")]
    LibsqlError(#[from] libsql::Error),

    /// SQL execution error with context
    #[error("SQL execution failed: {context}")]
    SqlExecutionError { context: String },

    /// A fetched row could not be decoded
    #[error("Failed to decode stored row: {context}")]
    RowDecodeError { context: String },

    /// A stored body was not a JSON object
    #[error("Failed to decode document body: {context}")]
    CodecError { context: String },
}

impl StoreError {
    /// Create an open failed error
    pub fn open_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::OpenFailed { path, source }
    }

    /// Create a SQL execution error with context
    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::SqlExecutionError {
            context: context.into(),
        }
    }

    /// Create a row decode error with context
    pub fn row_decode(context: impl Into<String>) -> Self {
        Self::RowDecodeError {
            context: context.into(),
        }
    }

    /// Create a body codec error with context
    pub fn codec(context: impl Into<String>) -> Self {
        Self::CodecError {
            context: context.into(),
        }
    }
}
