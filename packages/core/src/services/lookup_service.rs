//! Lookup Service - Batch Entity Enrichment
//!
//! Resolves a batch of entities against the document store: each
//! entity's value is substituted into the configured query template,
//! the filters are parsed up front, and the store lookups fan out
//! concurrently under a permit bound. The batch is all-or-nothing; the
//! first failure aborts it and outstanding lookups are dropped.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, trace};

use crate::config::IntegrationConfig;
use crate::db::{ConnectionManager, DocumentStore, StoreError};
use crate::models::{Document, Entity, Filter, ENTITY_PLACEHOLDER};
use crate::services::error::LookupError;
use crate::services::summary::summarize;
use crate::tree::{self, DetailsTree};

/// Result for one entity in a lookup batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupResult {
    pub entity: Entity,
    /// One tag per configured summary path.
    pub summary: Vec<String>,
    /// Stub details tree when a document matched, `None` otherwise.
    pub details: Option<DetailsTree>,
}

/// Batch lookup entry point.
///
/// Holds the shared connection manager and the integration
/// configuration; one instance serves any number of batches.
pub struct LookupService {
    connection: Arc<ConnectionManager>,
    config: IntegrationConfig,
}

impl LookupService {
    pub fn new(connection: Arc<ConnectionManager>, config: IntegrationConfig) -> Self {
        Self { connection, config }
    }

    /// Look up every entity and return results in input order.
    ///
    /// All filters are parsed before any store I/O, so a template that
    /// breaks under substitution fails the batch without touching the
    /// connection. Lookups then run concurrently, bounded by
    /// `max_concurrent_lookups` permits.
    pub async fn lookup(&self, entities: &[Entity]) -> Result<Vec<LookupResult>, LookupError> {
        trace!(?entities, "Looking up entities");

        let mut filters = Vec::with_capacity(entities.len());
        for entity in entities {
            let query = self
                .config
                .query_template
                .replace(ENTITY_PLACEHOLDER, &entity.value);
            debug!(query = %query, "Substituted query template");
            let filter = Filter::parse(&query)
                .map_err(|source| LookupError::query_parse(entity.value.clone(), source))?;
            filters.push(filter);
        }

        let store = self.connection.ensure(&self.config.store).await?;

        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_lookups.max(1)));
        let mut tasks = JoinSet::new();
        for (index, filter) in filters.into_iter().enumerate() {
            let store = Arc::clone(&store);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let permit = permits.acquire_owned().await.map_err(|e| {
                    StoreError::sql_execution(format!("Failed to acquire lookup permit: {}", e))
                });
                let result = match permit {
                    Ok(_permit) => store.find_one(&filter).await,
                    Err(e) => Err(e),
                };
                (index, result)
            });
        }

        let mut documents: Vec<Option<Document>> = vec![None; entities.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined.map_err(|e| {
                LookupError::query_execution(
                    None,
                    StoreError::sql_execution(format!("Lookup task failed: {}", e)),
                )
            })?;
            match result {
                Ok(document) => documents[index] = document,
                Err(source) => {
                    let entity = entities.get(index).map(|e| e.value.clone());
                    return Err(LookupError::query_execution(entity, source));
                }
            }
        }

        Ok(entities
            .iter()
            .zip(documents)
            .map(|(entity, document)| self.to_result(entity, document))
            .collect())
    }

    fn to_result(&self, entity: &Entity, document: Option<Document>) -> LookupResult {
        debug!(entity = %entity.value, matched = document.is_some(), "Lookup result");
        match document {
            Some(document) => LookupResult {
                entity: entity.clone(),
                summary: summarize(
                    &document,
                    &self.config.summary_fields,
                    self.config.include_field_name_in_summary,
                ),
                details: Some(tree::build_stub(&document, &self.config.title_field)),
            },
            // A miss still yields one tag per configured path.
            None => LookupResult {
                entity: entity.clone(),
                summary: summarize(
                    &Document::new(),
                    &self.config.summary_fields,
                    self.config.include_field_name_in_summary,
                ),
                details: None,
            },
        }
    }
}

// Include tests
#[cfg(test)]
#[path = "lookup_service_test.rs"]
mod lookup_service_test;
