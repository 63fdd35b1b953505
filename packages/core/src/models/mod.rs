//! Data Models
//!
//! Core data structures shared across the crate:
//!
//! - `Document` / `FieldValue` - typed, insertion-ordered documents
//! - `Entity` - lookup input from the upstream extractor
//! - `Filter` - structured equality filters built from templates
//!
//! Documents use the extended JSON convention: store-specific types ride
//! inside single-key `$`-tagged objects so plain JSON stays lossless.

pub mod document;
pub mod entity;
pub mod filter;

pub use document::{Document, DocumentError, FieldValue, ObjectId, ValueClass, NOT_DISPLAYED};
pub use entity::Entity;
pub use filter::{Filter, FilterClause, FilterParseError, ENTITY_PLACEHOLDER};
