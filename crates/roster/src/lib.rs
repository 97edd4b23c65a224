//! # Roster - presence state reconciliation for realtime channels
//!
//! Roster implements the client side of Phoenix-style presence tracking:
//! merging distributed "who is online, with what metadata" state across
//! peers without a central authority, tolerating out-of-order and partial
//! updates.
//!
//! # Overview
//!
//! The transport layer (a channel over a WebSocket, a message bus, a test
//! harness) receives presence payloads from the server and hands them to
//! this crate. Two kinds of payload exist:
//!
//! - **Sync**: a wholesale snapshot of the channel's presence table,
//!   reconciled with [`sync_state_with`]
//! - **Diff**: an explicit join/leave delta, applied with [`sync_diff_with`]
//!
//! Either way the reconciler returns the new canonical table and reports
//! every affected key through the supplied join/leave hooks. The functions
//! are pure: no state is retained between calls, caller-owned inputs are
//! never mutated, and the cost of a call is proportional to the keys and
//! metas it touches. Serializing calls for one table is the caller's
//! responsibility.
//!
//! A key (usually a user id) can be present through several connections at
//! once - two browser tabs, a phone and a laptop. Each connection carries a
//! [`PresenceMeta`]: a transport-assigned unique ref plus caller-defined
//! payload this crate passes through untouched.
//!
//! # Example
//!
//! ```
//! use roster::{sync_state_with, PresenceMeta, PresenceState, PresenceTable};
//!
//! let current: PresenceTable<()> = PresenceTable::new();
//! let mut snapshot = PresenceTable::new();
//! snapshot.insert(
//!     "user:1".to_string(),
//!     PresenceState::new(vec![PresenceMeta::new("r1", ())]),
//! );
//!
//! let table = sync_state_with(
//!     &current,
//!     &snapshot,
//!     |key, _previous, joined| println!("{key} joined with {} metas", joined.metas.len()),
//!     |key, _remaining, left| println!("{key} lost {} metas", left.metas.len()),
//! );
//! assert!(table.contains_key("user:1"));
//! ```
//!
//! # Tracking a channel
//!
//! [`PresenceTracker`] owns one channel's table and packages the loop above:
//! register `on_join` / `on_leave` / `on_sync` hooks, feed it raw payloads,
//! and query the merged table:
//!
//! ```
//! use roster::PresenceTracker;
//! use serde_json::json;
//!
//! let mut tracker: PresenceTracker<serde_json::Map<String, serde_json::Value>> =
//!     PresenceTracker::new();
//! tracker
//!     .sync_state_json(json!({
//!         "user:1": { "metas": [{ "phx_ref": "r1", "name": "Alice" }] }
//!     }))
//!     .unwrap();
//!
//! let online: Vec<&str> = tracker.list_by(|key, _entry| key).collect();
//! assert_eq!(online, vec!["user:1"]);
//! ```

#![deny(warnings)]
#![deny(missing_docs)]

/// Error types for the payload decode boundary.
pub mod error;

/// Pure reconciliation functions over tables and diffs.
pub mod sync;

/// Stateful per-channel presence tracking.
pub mod tracker;

/// Presence data model: refs, metas, entries, tables, diffs.
pub mod types;

pub use error::PresenceError;
pub use sync::{list, list_by, sync_diff, sync_diff_with, sync_state, sync_state_with};
pub use tracker::{JoinHook, LeaveHook, PresenceTracker, SyncHook};
pub use types::{PresenceDiff, PresenceMeta, PresenceRef, PresenceState, PresenceTable};
