//! DocumentStore Trait - Store Abstraction Layer
//!
//! Defines the `DocumentStore` trait that abstracts document persistence
//! for the lookup and mutation services. The trait keeps business logic
//! independent of the concrete backend wiring.
//!
//! All methods are async; embedded and remote backends both sit behind
//! the same seam.

use async_trait::async_trait;

use crate::db::error::StoreError;
use crate::models::{Document, Filter};

/// Result of a single-document update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// The store accepted and durably applied the write request.
    pub acknowledged: bool,
    /// Number of documents whose content actually changed. A write that
    /// sets a field to its current value reports zero.
    pub modified_count: u64,
}

/// Abstraction layer for document persistence operations
///
/// Implementations must be `Send + Sync` so connection handles can be
/// shared across concurrent lookup tasks.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Verify the store answers a trivial round trip.
    ///
    /// Used by the connection manager as the liveness probe; a failure
    /// invalidates the shared handle.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Fetch the first document matching the filter, in unspecified
    /// store order. An empty filter matches any document.
    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError>;

    /// Set one top-level field on the document with the given id text.
    ///
    /// Reports `modified_count: 0` when no document has that id or the
    /// field already holds the value.
    async fn update_one(
        &self,
        id: &str,
        key: &str,
        value: &str,
    ) -> Result<UpdateOutcome, StoreError>;
}
