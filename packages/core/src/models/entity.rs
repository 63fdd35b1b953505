//! Entities handed to the lookup pipeline.

use serde::{Deserialize, Serialize};

/// A single entity extracted upstream: the literal text plus an optional
/// type label (`IPv4`, `domain`, `hash`, ...). The lookup layer treats
/// the value as opaque text to substitute into filter templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub value: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
}

impl Entity {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            entity_type: None,
        }
    }

    pub fn with_type(value: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            entity_type: Some(entity_type.into()),
        }
    }
}
