//! Structured equality filters parsed from user-configured JSON templates.
//!
//! A filter template is a JSON object whose values are scalars, for
//! example `{"ip": "{{entity}}"}`. Each occurrence of the `{{entity}}`
//! placeholder is replaced with the entity text before parsing, so a
//! template that only becomes malformed after substitution fails at
//! parse time rather than at the store.

use serde_json::Value;
use thiserror::Error;

use crate::models::document::{FieldValue, ValueClass};

/// Placeholder token replaced with the entity value. Every occurrence
/// is substituted, not just the first.
pub const ENTITY_PLACEHOLDER: &str = "{{entity}}";

/// One `path = value` equality condition.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub path: String,
    pub value: FieldValue,
}

/// A conjunction of equality clauses. An empty filter matches any
/// document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    clauses: Vec<FilterClause>,
}

#[derive(Debug, Error)]
pub enum FilterParseError {
    #[error("filter is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("filter must be a JSON object")]
    NotAnObject,
    #[error("filter clause '{path}' must be a scalar value")]
    UnsupportedValue { path: String },
}

impl Filter {
    /// Parse filter text into clauses. Clause values may use extended
    /// JSON tags; nested objects and arrays are rejected because the
    /// store only evaluates scalar equality.
    pub fn parse(text: &str) -> Result<Self, FilterParseError> {
        let value: Value = serde_json::from_str(text)?;
        let map = match value {
            Value::Object(map) => map,
            _ => return Err(FilterParseError::NotAnObject),
        };

        let mut clauses = Vec::with_capacity(map.len());
        for (path, raw) in map {
            let value = FieldValue::from_json(raw);
            match value.classify() {
                ValueClass::Object | ValueClass::PrimitiveArray | ValueClass::ObjectArray => {
                    return Err(FilterParseError::UnsupportedValue { path });
                }
                _ => {}
            }
            clauses.push(FilterClause { path, value });
        }
        Ok(Self { clauses })
    }

    /// Substitute the entity into a template, then parse the result.
    pub fn from_template(template: &str, entity: &str) -> Result<Self, FilterParseError> {
        Self::parse(&template.replace(ENTITY_PLACEHOLDER, entity))
    }

    /// Filter matching a single document by its id text.
    pub fn by_id(id: &str) -> Self {
        Self {
            clauses: vec![FilterClause {
                path: "_id".to_string(),
                value: FieldValue::String(id.to_string()),
            }],
        }
    }

    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

// Include tests
#[cfg(test)]
#[path = "filter_test.rs"]
mod filter_test;
