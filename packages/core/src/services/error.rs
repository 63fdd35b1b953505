//! Service Layer Error Types
//!
//! Error types for the lookup and mutation services, plus the
//! serializable envelope every boundary failure is normalized into
//! before it reaches a caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{ConnectionError, StoreError};
use crate::models::FilterParseError;

/// Envelope detail for connection-phase failures.
pub const CONNECT_ERROR_DETAIL: &str = "Error connecting to document store";
/// Envelope detail for lookup failures (parse or execution).
pub const QUERY_ERROR_DETAIL: &str = "Error running query";
/// Envelope detail for field-update failures.
pub const UPDATE_ERROR_DETAIL: &str = "Error updating field";
/// Envelope detail for field-add failures.
pub const ADD_ERROR_DETAIL: &str = "Error adding field";
/// Envelope detail for re-fetch failures after a mutation or refresh.
pub const FETCH_ERROR_DETAIL: &str = "Error fetching document";

/// Batch lookup errors
///
/// The batch is all-or-nothing: the first failure aborts it, so one
/// error describes the whole call.
#[derive(Error, Debug)]
pub enum LookupError {
    /// Connection could not be established or re-verified
    #[error("Connection failed: {0}")]
    Connection(#[from] ConnectionError),

    /// Substituted query text did not parse as a filter
    #[error("Query for entity '{entity}' is invalid: {source}")]
    QueryParse {
        entity: String,
        #[source]
        source: FilterParseError,
    },

    /// A store lookup failed partway through the batch
    #[error("Query execution failed: {source}")]
    QueryExecution {
        /// Entity whose lookup failed, when the failure is attributable
        /// to a single task.
        entity: Option<String>,
        #[source]
        source: StoreError,
    },
}

impl LookupError {
    /// Create a query parse error
    pub fn query_parse(entity: impl Into<String>, source: FilterParseError) -> Self {
        Self::QueryParse {
            entity: entity.into(),
            source,
        }
    }

    /// Create a query execution error
    pub fn query_execution(entity: Option<String>, source: StoreError) -> Self {
        Self::QueryExecution { entity, source }
    }

    /// Short human string for the error envelope.
    pub fn detail(&self) -> &'static str {
        match self {
            Self::Connection(_) => CONNECT_ERROR_DETAIL,
            Self::QueryParse { .. } | Self::QueryExecution { .. } => QUERY_ERROR_DETAIL,
        }
    }

    /// Normalize into the boundary envelope.
    pub fn normalized(&self) -> NormalizedError {
        NormalizedError::from_error(self.detail(), self)
    }
}

/// Mutation and refresh errors
#[derive(Error, Debug)]
pub enum MutationError {
    /// Connection could not be established or re-verified
    #[error("Connection failed: {0}")]
    Connection(#[from] ConnectionError),

    /// The single-field update write failed
    #[error("Failed to update field '{key}' on document {id}: {source}")]
    Update {
        id: String,
        key: String,
        #[source]
        source: StoreError,
    },

    /// The single-field add write failed
    #[error("Failed to add field '{key}' to document {id}: {source}")]
    AddField {
        id: String,
        key: String,
        #[source]
        source: StoreError,
    },

    /// The re-fetch found no document, or failed outright
    #[error("Failed to fetch document {id}")]
    DocumentFetch {
        id: String,
        #[source]
        source: Option<StoreError>,
    },
}

impl MutationError {
    /// Create an update error
    pub fn update(id: impl Into<String>, key: impl Into<String>, source: StoreError) -> Self {
        Self::Update {
            id: id.into(),
            key: key.into(),
            source,
        }
    }

    /// Create an add-field error
    pub fn add_field(id: impl Into<String>, key: impl Into<String>, source: StoreError) -> Self {
        Self::AddField {
            id: id.into(),
            key: key.into(),
            source,
        }
    }

    /// Create a document fetch error
    pub fn document_fetch(id: impl Into<String>, source: Option<StoreError>) -> Self {
        Self::DocumentFetch {
            id: id.into(),
            source,
        }
    }

    /// Short human string for the error envelope.
    pub fn detail(&self) -> &'static str {
        match self {
            Self::Connection(_) => CONNECT_ERROR_DETAIL,
            Self::Update { .. } => UPDATE_ERROR_DETAIL,
            Self::AddField { .. } => ADD_ERROR_DETAIL,
            Self::DocumentFetch { .. } => FETCH_ERROR_DETAIL,
        }
    }

    /// Normalize into the boundary envelope.
    pub fn normalized(&self) -> NormalizedError {
        NormalizedError::from_error(self.detail(), self)
    }
}

/// Uniform error envelope returned across the message boundary
///
/// `detail` is the short string chosen by the call site; `error` is the
/// failure's own description; `message` carries the underlying cause
/// when one exists, and `stack` renders the full cause chain one frame
/// per line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedError {
    pub detail: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl NormalizedError {
    /// Build the envelope from any error value.
    pub fn from_error(detail: impl Into<String>, cause: &(dyn std::error::Error + 'static)) -> Self {
        let error = cause.to_string();
        let message = cause.source().map(|inner| inner.to_string());

        let mut frames = vec![error.clone()];
        let mut current = cause.source();
        while let Some(inner) = current {
            frames.push(inner.to_string());
            current = inner.source();
        }
        let stack = (frames.len() > 1).then(|| frames.join("\n"));

        Self {
            detail: detail.into(),
            error,
            message,
            stack,
        }
    }

    /// Build the envelope from bare strings, for failures that carry no
    /// underlying error value.
    pub fn from_detail(detail: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            error: error.into(),
            message: None,
            stack: None,
        }
    }
}

// Include tests
#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;
