//! Stateful per-channel presence tracking.
//!
//! [`PresenceTracker`] packages the pure reconciliation functions for callers
//! that want the library to own the channel's table: it registers join/leave/
//! sync hooks, accepts raw payloads handed over by the transport, and buffers
//! incremental diffs that arrive while the initial snapshot is still
//! outstanding (on channel join, and again after [`PresenceTracker::reset`]).
//!
//! The tracker holds no locks and spawns nothing; serializing calls for one
//! channel remains the caller's responsibility, e.g. by driving the tracker
//! from the channel's single event-processing loop.
//!
//! # Example
//!
//! ```
//! use roster::PresenceTracker;
//! use serde_json::json;
//!
//! let mut tracker: PresenceTracker<serde_json::Map<String, serde_json::Value>> =
//!     PresenceTracker::new();
//! tracker.on_join(|key, _previous, joined| {
//!     println!("{key} joined with {} metas", joined.metas.len());
//! });
//!
//! tracker
//!     .sync_state_json(json!({
//!         "user:1": { "metas": [{ "phx_ref": "r1", "name": "Alice" }] }
//!     }))
//!     .unwrap();
//! assert_eq!(tracker.state().len(), 1);
//! ```

use crate::error::PresenceError;
use crate::sync;
use crate::types::{PresenceDiff, PresenceState, PresenceTable};
use serde::de::DeserializeOwned;

/// Hook invoked for every key whose metas joined.
pub type JoinHook<P> = Box<dyn FnMut(&str, Option<&PresenceState<P>>, &PresenceState<P>) + Send>;

/// Hook invoked for every key whose metas left.
pub type LeaveHook<P> = Box<dyn FnMut(&str, &PresenceState<P>, &PresenceState<P>) + Send>;

/// Hook invoked after each applied snapshot or diff.
pub type SyncHook = Box<dyn FnMut() + Send>;

/// Tracks the merged presence table of a single channel.
pub struct PresenceTracker<P> {
    state: PresenceTable<P>,
    pending_diffs: Vec<PresenceDiff<P>>,
    synced: bool,
    on_join: Option<JoinHook<P>>,
    on_leave: Option<LeaveHook<P>>,
    on_sync: Option<SyncHook>,
}

impl<P> PresenceTracker<P> {
    /// Create a tracker with an empty table, awaiting the first snapshot.
    pub fn new() -> Self {
        Self {
            state: PresenceTable::new(),
            pending_diffs: Vec::new(),
            synced: false,
            on_join: None,
            on_leave: None,
            on_sync: None,
        }
    }

    /// Register the join hook, replacing any previous registration.
    pub fn on_join<F>(&mut self, hook: F)
    where
        F: FnMut(&str, Option<&PresenceState<P>>, &PresenceState<P>) + Send + 'static,
    {
        self.on_join = Some(Box::new(hook));
    }

    /// Register the leave hook, replacing any previous registration.
    pub fn on_leave<F>(&mut self, hook: F)
    where
        F: FnMut(&str, &PresenceState<P>, &PresenceState<P>) + Send + 'static,
    {
        self.on_leave = Some(Box::new(hook));
    }

    /// Register the sync hook, replacing any previous registration.
    pub fn on_sync<F>(&mut self, hook: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.on_sync = Some(Box::new(hook));
    }

    /// Borrow the owned presence table.
    pub fn state(&self) -> &PresenceTable<P> {
        &self.state
    }

    /// Whether the initial snapshot has been applied. While `false`,
    /// incremental diffs are buffered instead of applied.
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Iterate over the owned table's entries.
    pub fn list(&self) -> impl Iterator<Item = &PresenceState<P>> {
        sync::list(&self.state)
    }

    /// Iterate over the owned table, projecting each `(key, entry)` pair
    /// through `chooser`.
    pub fn list_by<'a, R, F>(&'a self, chooser: F) -> impl Iterator<Item = R>
    where
        F: FnMut(&'a str, &'a PresenceState<P>) -> R,
    {
        sync::list_by(&self.state, chooser)
    }

    /// Drop the table and any buffered diffs and return to awaiting a
    /// snapshot. Called on channel rejoin, when the server will resend the
    /// full state.
    pub fn reset(&mut self) {
        tracing::trace!(
            keys = self.state.len(),
            pending = self.pending_diffs.len(),
            "presence tracker reset"
        );
        self.state.clear();
        self.pending_diffs.clear();
        self.synced = false;
    }
}

impl<P: Clone> PresenceTracker<P> {
    /// Reconcile a full snapshot into the owned table, then apply any diffs
    /// that were buffered while the snapshot was outstanding, in arrival
    /// order. Fires join/leave hooks per affected key and the sync hook once
    /// at the end.
    pub fn sync_state(&mut self, new_state: PresenceTable<P>) {
        let on_join = &mut self.on_join;
        let on_leave = &mut self.on_leave;
        let next = sync::sync_state_with(
            &self.state,
            &new_state,
            |key, previous, joined| {
                if let Some(hook) = on_join.as_mut() {
                    hook(key, previous, joined)
                }
            },
            |key, remaining, left| {
                if let Some(hook) = on_leave.as_mut() {
                    hook(key, remaining, left)
                }
            },
        );
        self.state = next;
        tracing::debug!(keys = self.state.len(), "applied presence snapshot");

        let pending = std::mem::take(&mut self.pending_diffs);
        if !pending.is_empty() {
            tracing::debug!(diffs = pending.len(), "applying buffered presence diffs");
        }
        for diff in &pending {
            self.apply_diff(diff);
        }

        self.synced = true;
        self.fire_sync();
    }

    /// Apply an incremental diff to the owned table, or buffer it if the
    /// initial snapshot has not arrived yet. Fires join/leave hooks and then
    /// the sync hook when the diff is applied.
    pub fn sync_diff(&mut self, diff: PresenceDiff<P>) {
        if !self.synced {
            tracing::trace!(
                joins = diff.joins.len(),
                leaves = diff.leaves.len(),
                "buffering presence diff until initial snapshot"
            );
            self.pending_diffs.push(diff);
            return;
        }

        self.apply_diff(&diff);
        self.fire_sync();
    }

    /// Decode a raw snapshot payload and apply it via
    /// [`PresenceTracker::sync_state`]. On decode failure the owned state is
    /// untouched.
    pub fn sync_state_json(&mut self, payload: serde_json::Value) -> Result<(), PresenceError>
    where
        P: DeserializeOwned,
    {
        let new_state: PresenceTable<P> = serde_json::from_value(payload)?;
        self.sync_state(new_state);
        Ok(())
    }

    /// Decode a raw diff payload and apply it via
    /// [`PresenceTracker::sync_diff`]. On decode failure the owned state is
    /// untouched.
    pub fn sync_diff_json(&mut self, payload: serde_json::Value) -> Result<(), PresenceError>
    where
        P: DeserializeOwned,
    {
        let diff: PresenceDiff<P> = serde_json::from_value(payload)?;
        self.sync_diff(diff);
        Ok(())
    }

    fn apply_diff(&mut self, diff: &PresenceDiff<P>) {
        let on_join = &mut self.on_join;
        let on_leave = &mut self.on_leave;
        let next = sync::sync_diff_with(
            &self.state,
            diff,
            |key, previous, joined| {
                if let Some(hook) = on_join.as_mut() {
                    hook(key, previous, joined)
                }
            },
            |key, remaining, left| {
                if let Some(hook) = on_leave.as_mut() {
                    hook(key, remaining, left)
                }
            },
        );
        self.state = next;
        tracing::trace!(
            joins = diff.joins.len(),
            leaves = diff.leaves.len(),
            keys = self.state.len(),
            "applied presence diff"
        );
    }

    fn fire_sync(&mut self) {
        if let Some(hook) = self.on_sync.as_mut() {
            hook()
        }
    }
}

impl<P> Default for PresenceTracker<P> {
    fn default() -> Self {
        Self::new()
    }
}
