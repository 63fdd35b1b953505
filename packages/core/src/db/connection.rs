//! Shared Connection Lifecycle
//!
//! One process-wide store connection, established lazily on first use.
//! Every reuse re-verifies liveness with a ping; any failure tears the
//! handle down completely so the next call rebuilds from scratch rather
//! than limping along half-connected.
//!
//! Establishment runs under an async mutex, so concurrent callers that
//! race on a cold start coalesce onto a single connect attempt and end
//! up sharing the same handle.

use std::sync::{Arc, RwLock};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::StoreConfig;
use crate::db::error::StoreError;
use crate::db::store::DocumentStore;
use crate::db::turso_store::TursoCollection;

/// Observable lifecycle of the shared connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No handle; the next use will connect.
    Disconnected,
    /// An establishment attempt is in flight.
    Connecting,
    /// A verified handle is cached.
    Connected,
    /// The cached handle flunked its liveness probe and is being torn
    /// down.
    Failed,
}

/// Errors from connection establishment, one variant per step.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Opening the database failed
    #[error("Failed to open document store: {0}")]
    Open(#[source] StoreError),

    /// The liveness probe failed after opening
    #[error("Store liveness check failed: {0}")]
    Liveness(#[source] StoreError),

    /// Collection preparation failed on a live connection
    #[error("Failed to prepare collection: {0}")]
    Setup(#[source] StoreError),
}

/// Caches one verified [`TursoCollection`] and hands out shared clones.
///
/// Services call [`ConnectionManager::ensure`] before every batch of
/// store work; the manager decides whether the cached handle is still
/// good or a fresh connect is needed.
pub struct ConnectionManager {
    slot: Mutex<Option<Arc<TursoCollection>>>,
    state: RwLock<ConnectionState>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            state: RwLock::new(ConnectionState::Disconnected),
        }
    }

    /// Current lifecycle state, for observability and tests.
    pub fn state(&self) -> ConnectionState {
        self.state
            .read()
            .map(|s| *s)
            .unwrap_or(ConnectionState::Failed)
    }

    fn set_state(&self, next: ConnectionState) {
        if let Ok(mut state) = self.state.write() {
            *state = next;
        }
    }

    /// Return a verified connection, establishing one if needed.
    ///
    /// Sequence on a cold start: open the database (selecting the
    /// configured database), probe liveness, prepare the collection.
    /// A cached handle is re-probed before reuse; if the probe fails
    /// the handle is discarded and a fresh attempt follows in the same
    /// call. On any failure the slot is cleared and the error is
    /// returned, leaving the manager fully disconnected.
    pub async fn ensure(
        &self,
        config: &StoreConfig,
    ) -> Result<Arc<TursoCollection>, ConnectionError> {
        let mut slot = self.slot.lock().await;

        if let Some(existing) = slot.as_ref() {
            match existing.ping().await {
                Ok(()) => return Ok(Arc::clone(existing)),
                Err(e) => {
                    self.set_state(ConnectionState::Failed);
                    warn!("Cached store connection failed liveness check: {}", e);
                    *slot = None;
                }
            }
        }

        self.set_state(ConnectionState::Connecting);
        debug!(
            store_target = %config.connection_target,
            database = %config.database,
            collection = %config.collection,
            "Connecting to document store"
        );

        match Self::establish(config).await {
            Ok(store) => {
                let store = Arc::new(store);
                *slot = Some(Arc::clone(&store));
                self.set_state(ConnectionState::Connected);
                info!("Successfully connected to document store");
                Ok(store)
            }
            Err(e) => {
                *slot = None;
                self.set_state(ConnectionState::Disconnected);
                error!("Error connecting to document store: {}", e);
                Err(e)
            }
        }
    }

    async fn establish(config: &StoreConfig) -> Result<TursoCollection, ConnectionError> {
        let store = TursoCollection::open(config)
            .await
            .map_err(ConnectionError::Open)?;
        store.ping().await.map_err(ConnectionError::Liveness)?;
        store
            .prepare_collection()
            .await
            .map_err(ConnectionError::Setup)?;
        Ok(store)
    }

    /// Drop the cached handle so the next use reconnects.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.lock().await;
        *slot = None;
        self.set_state(ConnectionState::Disconnected);
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
