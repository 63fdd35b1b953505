//! Business Services
//!
//! This module contains the core business logic services:
//!
//! - `LookupService` - Batch entity lookups against the document store
//! - `MutationService` - Single-field writes and document refresh
//! - `summary` - Summary tag construction for lookup results
//! - `error` - Service errors and the normalized boundary envelope
//!
//! Services coordinate between the connection manager, the store, and
//! the tree builder, and normalize every failure before it crosses the
//! caller boundary.

pub mod error;
pub mod lookup_service;
pub mod mutation_service;
pub mod summary;

pub use error::{LookupError, MutationError, NormalizedError};
pub use lookup_service::{LookupResult, LookupService};
pub use mutation_service::{MutationOutcome, MutationService};
pub use summary::summarize;
