//! Details-View Message Dispatch
//!
//! Accepts the JSON payloads the details view sends for document
//! refresh, field update, and field add, runs them through the
//! mutation service, and shapes the responses the view renders.
//! Failures cross this boundary only as the normalized error envelope.

use serde::Deserialize;
use serde_json::Value;

use crate::services::{MutationService, NormalizedError};
use crate::tree::DetailsTree;

/// Envelope detail for payloads that do not deserialize.
pub const MALFORMED_PAYLOAD_DETAIL: &str = "Unsupported message payload";
/// Success string merged into update responses.
pub const UPDATE_SUCCESS_DETAIL: &str = "Successfully updated field";
/// Success string merged into add responses.
pub const ADD_SUCCESS_DETAIL: &str = "Successfully added field";

const SERIALIZE_ERROR_DETAIL: &str = "Error serializing details";

/// Actions the details view can request.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action")]
pub enum MessagePayload {
    /// Re-fetch the document and return a fresh full tree.
    #[serde(rename = "REFRESH_DOCUMENT")]
    RefreshDocument { id: String },

    /// Set an existing field to a new value.
    #[serde(rename = "UPDATE_FIELD")]
    UpdateField {
        id: String,
        key: String,
        value: String,
    },

    /// Add a field the document does not carry yet.
    #[serde(rename = "ADD_FIELD")]
    AddField {
        id: String,
        key: String,
        value: String,
    },
}

/// Dispatch one message payload.
///
/// Mutation responses are the rebuilt tree with a `detail` success
/// string merged in; refresh responses are the bare tree. An unknown
/// action or missing field fails before any service call.
pub async fn handle_message(
    service: &MutationService,
    payload: Value,
) -> Result<Value, NormalizedError> {
    let message: MessagePayload = serde_json::from_value(payload)
        .map_err(|e| NormalizedError::from_error(MALFORMED_PAYLOAD_DETAIL, &e))?;

    match message {
        MessagePayload::RefreshDocument { id } => {
            let tree = service.refresh(&id).await.map_err(|e| e.normalized())?;
            serialize_tree(&tree)
        }
        MessagePayload::UpdateField { id, key, value } => {
            let outcome = service
                .update_field(&id, &key, &value)
                .await
                .map_err(|e| e.normalized())?;
            Ok(with_detail(
                serialize_tree(&outcome.details)?,
                UPDATE_SUCCESS_DETAIL,
            ))
        }
        MessagePayload::AddField { id, key, value } => {
            let outcome = service
                .add_field(&id, &key, &value)
                .await
                .map_err(|e| e.normalized())?;
            Ok(with_detail(
                serialize_tree(&outcome.details)?,
                ADD_SUCCESS_DETAIL,
            ))
        }
    }
}

fn serialize_tree(tree: &DetailsTree) -> Result<Value, NormalizedError> {
    serde_json::to_value(tree).map_err(|e| NormalizedError::from_error(SERIALIZE_ERROR_DETAIL, &e))
}

fn with_detail(mut tree: Value, detail: &str) -> Value {
    if let Some(map) = tree.as_object_mut() {
        map.insert("detail".to_string(), Value::String(detail.to_string()));
    }
    tree
}

// Include tests
#[cfg(test)]
#[path = "messages_test.rs"]
mod messages_test;
