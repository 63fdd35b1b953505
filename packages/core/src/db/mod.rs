//! Database Layer
//!
//! Document persistence over libsql/Turso:
//!
//! - `DocumentStore` - the trait seam services program against
//! - `TursoCollection` - one collection as one extended-JSON table
//! - `ConnectionManager` - shared lazy connection with verify-on-reuse
//!
//! Documents live as extended-JSON text bodies keyed by id; filters are
//! evaluated with SQLite's native JSON operators.

mod connection;
mod error;
mod store;
mod turso_store;

pub use connection::{ConnectionError, ConnectionManager, ConnectionState};
pub use error::StoreError;
pub use store::{DocumentStore, UpdateOutcome};
pub use turso_store::TursoCollection;
