//! Mutation Service - Field Writes and Document Refresh
//!
//! Single-field updates and adds against a stored document, plus the
//! refresh path the details view uses. Every operation ends with a
//! re-fetch and a full tree rebuild so the caller always renders the
//! store's current state, not a local guess.

use std::sync::Arc;

use tracing::debug;

use crate::config::IntegrationConfig;
use crate::db::{ConnectionManager, DocumentStore, TursoCollection};
use crate::models::Filter;
use crate::services::error::MutationError;
use crate::tree::{self, DetailsTree};

/// Outcome of a field update or add.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    /// Whether the write changed stored content. Setting a field to
    /// its current value acknowledges without modifying.
    pub is_modified: bool,
    /// Fully rebuilt details tree after the write.
    pub details: DetailsTree,
}

/// Field mutation and refresh entry point.
pub struct MutationService {
    connection: Arc<ConnectionManager>,
    config: IntegrationConfig,
}

impl MutationService {
    pub fn new(connection: Arc<ConnectionManager>, config: IntegrationConfig) -> Self {
        Self { connection, config }
    }

    /// Set an existing top-level field, then rebuild the full tree.
    pub async fn update_field(
        &self,
        id: &str,
        key: &str,
        value: &str,
    ) -> Result<MutationOutcome, MutationError> {
        let store = self.connection.ensure(&self.config.store).await?;
        let outcome = store
            .update_one(id, key, value)
            .await
            .map_err(|source| MutationError::update(id, key, source))?;
        debug!(id = %id, key = %key, modified = outcome.modified_count, "Updated field");

        let details = self.fetch_tree(store.as_ref(), id).await?;
        Ok(MutationOutcome {
            is_modified: outcome.modified_count > 0,
            details,
        })
    }

    /// Add a field the document does not have yet, then rebuild the
    /// full tree. Shares the update write path; the distinction exists
    /// for error reporting.
    pub async fn add_field(
        &self,
        id: &str,
        key: &str,
        value: &str,
    ) -> Result<MutationOutcome, MutationError> {
        let store = self.connection.ensure(&self.config.store).await?;
        let outcome = store
            .update_one(id, key, value)
            .await
            .map_err(|source| MutationError::add_field(id, key, source))?;
        debug!(id = %id, key = %key, modified = outcome.modified_count, "Added field");

        let details = self.fetch_tree(store.as_ref(), id).await?;
        Ok(MutationOutcome {
            is_modified: outcome.modified_count > 0,
            details,
        })
    }

    /// Re-fetch a document and rebuild its full tree, with no write.
    pub async fn refresh(&self, id: &str) -> Result<DetailsTree, MutationError> {
        let store = self.connection.ensure(&self.config.store).await?;
        self.fetch_tree(store.as_ref(), id).await
    }

    async fn fetch_tree(
        &self,
        store: &TursoCollection,
        id: &str,
    ) -> Result<DetailsTree, MutationError> {
        let document = store
            .find_one(&Filter::by_id(id))
            .await
            .map_err(|source| MutationError::document_fetch(id, Some(source)))?
            .ok_or_else(|| MutationError::document_fetch(id, None))?;
        Ok(tree::build(&document, &self.config.title_field))
    }
}

// Include tests
#[cfg(test)]
#[path = "mutation_service_test.rs"]
mod mutation_service_test;
