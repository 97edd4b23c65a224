//! Presence data model.
//!
//! A presence table maps an opaque key (usually a user or session id) to the
//! set of physical connections currently online for that key. Each connection
//! is described by a [`PresenceMeta`]: a transport-assigned [`PresenceRef`]
//! plus an arbitrary caller-defined payload that this crate never interprets.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A unique reference for a presence entry.
///
/// Refs are opaque strings assigned by the transport layer, one per physical
/// connection, and are never reused while that connection is alive. Two metas
/// carrying the same ref describe the same connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresenceRef(String);

impl PresenceRef {
    /// Create a PresenceRef from a string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the ref as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this ref is the empty-string placeholder a malformed meta
    /// (one arriving without a ref field) decodes to.
    pub fn is_missing(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for PresenceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata for a single presence entry.
///
/// The payload type `P` is caller-defined and passed through untouched; on
/// the wire its fields sit next to `phx_ref` in the same object. A payload
/// arriving without a `phx_ref` field decodes with the empty-string ref,
/// which any subsequent real join on the same key eclipses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceMeta<P> {
    /// Unique reference for this presence entry.
    #[serde(default)]
    pub phx_ref: PresenceRef,
    /// Custom metadata, opaque to the reconciler.
    #[serde(flatten)]
    pub payload: P,
}

impl<P> PresenceMeta<P> {
    /// Create new presence metadata.
    pub fn new(phx_ref: impl Into<String>, payload: P) -> Self {
        Self {
            phx_ref: PresenceRef::from_string(phx_ref),
            payload,
        }
    }
}

/// Presence state for a single key (e.g., a user).
///
/// A key can have multiple metas at once (multiple tabs/devices). The only
/// ordering guarantee is that metas joined in a later sync cycle sit ahead
/// of metas that were already present for the key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceState<P> {
    /// All metadata entries for this key.
    pub metas: Vec<PresenceMeta<P>>,
}

impl<P> PresenceState<P> {
    /// Create an entry from a list of metas.
    pub fn new(metas: Vec<PresenceMeta<P>>) -> Self {
        Self { metas }
    }

    /// Whether this entry has no metas left.
    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }

    /// Iterate over the refs of this entry's metas.
    pub fn refs(&self) -> impl Iterator<Item = &PresenceRef> {
        self.metas.iter().map(|m| &m.phx_ref)
    }

    /// Whether any meta of this entry carries the given ref.
    pub fn contains_ref(&self, phx_ref: &PresenceRef) -> bool {
        self.refs().any(|r| r == phx_ref)
    }
}

impl<P> Default for PresenceState<P> {
    fn default() -> Self {
        Self { metas: Vec::new() }
    }
}

/// The canonical "who's present" snapshot for one channel.
///
/// Keys are unique; insertion order carries no meaning. The table is owned
/// by whichever component last called the reconciler — the reconciler itself
/// keeps no state between calls.
pub type PresenceTable<P> = HashMap<String, PresenceState<P>>;

/// A diff representing presence changes since the last sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceDiff<P> {
    /// Metas that newly appeared, keyed like the table.
    pub joins: PresenceTable<P>,
    /// Metas that disappeared, keyed like the table.
    pub leaves: PresenceTable<P>,
}

impl<P> PresenceDiff<P> {
    /// Check if the diff is empty.
    pub fn is_empty(&self) -> bool {
        self.joins.is_empty() && self.leaves.is_empty()
    }
}

impl<P> Default for PresenceDiff<P> {
    fn default() -> Self {
        Self {
            joins: PresenceTable::new(),
            leaves: PresenceTable::new(),
        }
    }
}
