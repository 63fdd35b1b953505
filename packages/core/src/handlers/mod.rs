//! Message Handlers
//!
//! Handler modules for the details-view message contract. The view
//! speaks JSON payloads tagged with an `action` field; responses are
//! serialized details trees or normalized error envelopes.

pub mod messages;

pub use messages::{
    handle_message, MessagePayload, ADD_SUCCESS_DETAIL, MALFORMED_PAYLOAD_DETAIL,
    UPDATE_SUCCESS_DETAIL,
};
