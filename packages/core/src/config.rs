//! Integration Configuration
//!
//! The option bundle supplied by the host application: where the document
//! store lives, how lookups are filtered, and how results are summarized.
//! `validate` runs before any connection attempt and reports every bad
//! option at once, each scoped to its option key.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::filter::{Filter, ENTITY_PLACEHOLDER};

/// Placeholder-neutralizing probe used when validating filter templates.
/// `0` stays valid JSON whether the template quotes the placeholder or not.
const VALIDATION_PROBE: &str = "0";

/// Location of the document store plus credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    /// Directory for local databases, `:memory:`, or a remote
    /// `libsql://` / `https://` URL.
    #[serde(default)]
    pub connection_target: String,

    /// Auth token for remote targets. Ignored for local files.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Database to search. Local targets map this to
    /// `<connection_target>/<database>.db`.
    #[serde(default)]
    pub database: String,

    /// Collection to search within the database.
    #[serde(default)]
    pub collection: String,
}

/// Full option bundle for the integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationConfig {
    #[serde(default)]
    pub store: StoreConfig,

    /// Filter template executed per entity. Every `{{entity}}`
    /// occurrence is replaced with the entity text.
    #[serde(default = "default_query_template")]
    pub query_template: String,

    /// Field whose value titles the details tree.
    #[serde(default = "default_id_field")]
    pub title_field: String,

    /// Comma-delimited dotted paths to include as summary tags
    /// (no spaces between commas).
    #[serde(default = "default_id_field")]
    pub summary_fields: String,

    /// Prefix each summary tag with its field path.
    #[serde(default = "default_true")]
    pub include_field_name_in_summary: bool,

    /// Comma-delimited field names users may add to a document when
    /// the document does not already contain them.
    #[serde(default)]
    pub addable_fields: String,

    /// Upper bound on concurrent per-entity store lookups.
    #[serde(default = "default_max_concurrent_lookups")]
    pub max_concurrent_lookups: usize,
}

fn default_query_template() -> String {
    "{}".to_string()
}

fn default_id_field() -> String {
    "_id".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent_lookups() -> usize {
    10
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            query_template: default_query_template(),
            title_field: default_id_field(),
            summary_fields: default_id_field(),
            include_field_name_in_summary: true,
            addable_fields: String::new(),
            max_concurrent_lookups: default_max_concurrent_lookups(),
        }
    }
}

/// A single rejected option: which key failed and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidOption {
    pub key: String,
    pub message: String,
}

impl InvalidOption {
    fn new(key: &str, message: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// All validation failures for one configuration, collected so the host
/// can surface every bad option in a single pass.
#[derive(Debug, Error)]
#[error("configuration failed validation ({} invalid option(s))", .errors.len())]
pub struct ValidationError {
    pub errors: Vec<InvalidOption>,
}

impl IntegrationConfig {
    /// Validate the bundle without touching the store.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();

        if self.store.connection_target.is_empty() {
            errors.push(InvalidOption::new(
                "connectionTarget",
                "You must provide a connection target for the document store.",
            ));
        }

        if self.store.database.is_empty() {
            errors.push(InvalidOption::new(
                "database",
                "You must provide a database to search.",
            ));
        }

        if self.store.collection.is_empty() {
            errors.push(InvalidOption::new(
                "collection",
                "You must provide a collection to search.",
            ));
        } else if !is_valid_collection_name(&self.store.collection) {
            errors.push(InvalidOption::new(
                "collection",
                "Collection names may only contain letters, digits, and underscores.",
            ));
        }

        if !self.query_template.is_empty() {
            let probed = self.query_template.replace(ENTITY_PLACEHOLDER, VALIDATION_PROBE);
            if let Err(e) = Filter::parse(&probed) {
                errors.push(InvalidOption::new(
                    "queryTemplate",
                    format!("Search query is not a valid filter: {}", e),
                ));
            }
        }

        if self.max_concurrent_lookups == 0 {
            errors.push(InvalidOption::new(
                "maxConcurrentLookups",
                "Concurrent lookup limit must be at least 1.",
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { errors })
        }
    }
}

/// Collection names end up interpolated into SQL identifiers, so the
/// charset is restricted rather than quoted.
fn is_valid_collection_name(name: &str) -> bool {
    name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// Include tests
#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
