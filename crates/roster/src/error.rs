//! Error types for the payload decode boundary.
//!
//! Reconciliation itself is total and never fails; errors only arise when a
//! raw transport payload does not match the presence data model.

use thiserror::Error;

/// Errors that can occur while decoding raw presence payloads.
#[derive(Debug, Error)]
pub enum PresenceError {
    /// The payload did not match the keyed-map-of-metas shape.
    #[error("malformed presence payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}
