//! End-to-end presence scenarios: a user opening and closing tabs against a
//! channel, driven the way a transport layer would drive the library — full
//! snapshots through `sync_state`, incremental deltas through `sync_diff`,
//! and raw JSON payloads through a `PresenceTracker`.

use roster::{
    sync_diff, sync_state, sync_state_with, PresenceDiff, PresenceMeta, PresenceState,
    PresenceTable, PresenceTracker,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct UserInfo {
    name: String,
}

fn user_meta(phx_ref: &str, name: &str) -> PresenceMeta<UserInfo> {
    PresenceMeta::new(phx_ref, UserInfo { name: name.into() })
}

fn refs(entry: &PresenceState<UserInfo>) -> Vec<&str> {
    entry.refs().map(|r| r.as_str()).collect()
}

/// A full session: Alice opens a tab, opens a second one, closes the first,
/// then disconnects entirely. Each server snapshot is reconciled against the
/// previous table and the join/leave hooks report exactly what changed.
#[test]
fn test_tab_lifecycle_via_snapshots() {
    let mut table: PresenceTable<UserInfo> = PresenceTable::new();

    // Tab one opens.
    let snapshot: PresenceTable<UserInfo> =
        [("u1".to_string(), PresenceState::new(vec![user_meta("r1", "Alice")]))]
            .into_iter()
            .collect();
    let mut joins = Vec::new();
    table = sync_state_with(
        &table,
        &snapshot,
        |key, previous, joined| joins.push((key.to_string(), previous.is_none(), refs(joined).len())),
        |_, _, _| {},
    );
    assert_eq!(joins, vec![("u1".to_string(), true, 1)]);
    assert_eq!(refs(&table["u1"]), vec!["r1"]);

    // Tab two opens: only the new meta joins, and it lands ahead of r1.
    let snapshot: PresenceTable<UserInfo> = [(
        "u1".to_string(),
        PresenceState::new(vec![user_meta("r1", "Alice"), user_meta("r2", "Alice")]),
    )]
    .into_iter()
    .collect();
    let mut joined_refs = Vec::new();
    table = sync_state_with(
        &table,
        &snapshot,
        |_, _, joined| joined_refs.extend(refs(joined).into_iter().map(String::from)),
        |_, _, _| {},
    );
    assert_eq!(joined_refs, vec!["r2"]);
    assert_eq!(refs(&table["u1"]), vec!["r2", "r1"]);

    // Tab one closes.
    let snapshot: PresenceTable<UserInfo> =
        [("u1".to_string(), PresenceState::new(vec![user_meta("r2", "Alice")]))]
            .into_iter()
            .collect();
    let mut leaves = Vec::new();
    table = sync_state_with(
        &table,
        &snapshot,
        |_, _, _| {},
        |key, remaining, left| {
            leaves.push((key.to_string(), refs(remaining).len(), refs(left) == ["r1"]));
        },
    );
    assert_eq!(leaves, vec![("u1".to_string(), 1, true)]);
    assert_eq!(refs(&table["u1"]), vec!["r2"]);

    // Alice disconnects entirely.
    let mut leaves = Vec::new();
    table = sync_state_with(
        &table,
        &PresenceTable::new(),
        |_, _, _| {},
        |key, remaining, left| {
            leaves.push((key.to_string(), remaining.is_empty(), refs(left) == ["r2"]));
        },
    );
    assert_eq!(leaves, vec![("u1".to_string(), true, true)]);
    assert!(table.is_empty());
}

/// A diff whose joins and leaves name the same ref nets out to nothing: the
/// join pass inserts the key, the leave pass empties and deletes it.
#[test]
fn test_self_canceling_diff() {
    let diff: PresenceDiff<UserInfo> = PresenceDiff {
        joins: [("u2".to_string(), PresenceState::new(vec![user_meta("rX", "Bob")]))]
            .into_iter()
            .collect(),
        leaves: [("u2".to_string(), PresenceState::new(vec![user_meta("rX", "Bob")]))]
            .into_iter()
            .collect(),
    };

    let table = sync_diff(&PresenceTable::new(), &diff);
    assert!(table.is_empty());
}

/// Reconciling the same snapshot again changes nothing and reports nothing.
#[test]
fn test_snapshot_reconciliation_is_stable() {
    let snapshot: PresenceTable<UserInfo> = [(
        "u1".to_string(),
        PresenceState::new(vec![user_meta("r1", "Alice"), user_meta("r2", "Alice")]),
    )]
    .into_iter()
    .collect();

    let table = sync_state(&PresenceTable::new(), &snapshot);
    let callbacks = std::cell::Cell::new(0);
    let again = sync_state_with(
        &table,
        &snapshot,
        |_, _, _| callbacks.set(callbacks.get() + 1),
        |_, _, _| callbacks.set(callbacks.get() + 1),
    );

    assert_eq!(table, again);
    assert_eq!(callbacks.get(), 0);
}

/// The tracker driven with raw JSON payloads, the shape a Phoenix-style
/// server broadcasts: a snapshot on join, then incremental diffs. A diff
/// racing ahead of the snapshot is buffered until the snapshot lands.
#[test]
fn test_tracker_over_raw_payloads() {
    let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let mut tracker: PresenceTracker<UserInfo> = PresenceTracker::new();
    let log = Arc::clone(&events);
    tracker.on_join(move |key, _, joined| {
        for meta in &joined.metas {
            log.lock().unwrap().push(format!("+{key}:{}", meta.payload.name));
        }
    });
    let log = Arc::clone(&events);
    tracker.on_leave(move |key, _, left| {
        for meta in &left.metas {
            log.lock().unwrap().push(format!("-{key}:{}", meta.payload.name));
        }
    });
    let log = Arc::clone(&events);
    tracker.on_sync(move || log.lock().unwrap().push("sync".to_string()));

    // The diff raced ahead of the snapshot: buffered, no events yet.
    tracker
        .sync_diff_json(json!({
            "joins": { "u2": { "metas": [{ "phx_ref": "r2", "name": "Bob" }] } },
            "leaves": {}
        }))
        .unwrap();
    assert!(events.lock().unwrap().is_empty());

    // Snapshot lands: snapshot join, buffered join, one sync.
    tracker
        .sync_state_json(json!({
            "u1": { "metas": [{ "phx_ref": "r1", "name": "Alice" }] }
        }))
        .unwrap();
    assert_eq!(
        *events.lock().unwrap(),
        vec!["+u1:Alice", "+u2:Bob", "sync"]
    );
    assert_eq!(tracker.state().len(), 2);

    // Bob leaves.
    tracker
        .sync_diff_json(json!({
            "joins": {},
            "leaves": { "u2": { "metas": [{ "phx_ref": "r2", "name": "Bob" }] } }
        }))
        .unwrap();
    assert_eq!(tracker.state().len(), 1);

    let names: Vec<String> = tracker
        .list_by(|_, entry| entry.metas[0].payload.name.clone())
        .collect();
    assert_eq!(names, vec!["Alice"]);
}
