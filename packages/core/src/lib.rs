//! DocLens Core Business Logic Layer
//!
//! This crate provides the document lookup, tree construction, and field
//! mutation core for the DocLens entity-enrichment integration.
//!
//! # Architecture
//!
//! - **Extended JSON documents**: field order and typed scalar tags are
//!   preserved end to end, storage through rendering
//! - **libsql/Turso**: embedded SQLite-compatible storage, with remote
//!   targets behind the same API
//! - **Lazy connection**: one verified store handle shared by every
//!   lookup and mutation, re-probed before reuse
//! - **Lazy tree expansion**: lookups return stub trees; the full tree
//!   builds only when a details view asks for it
//!
//! # Modules
//!
//! - [`models`] - Data structures (Document, FieldValue, Entity, Filter)
//! - [`tree`] - Details tree construction
//! - [`services`] - Business services (LookupService, MutationService)
//! - [`db`] - Store layer with libsql integration
//! - [`handlers`] - Details-view message contract
//! - [`config`] - Integration options and validation
//! - [`logging`] - Tracing bootstrap

pub mod config;
pub mod db;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod services;
pub mod tree;

// Re-export commonly used types
pub use models::*;
pub use services::*;
pub use tree::{build, build_stub, DetailsTree, FieldKind, FieldNode};
