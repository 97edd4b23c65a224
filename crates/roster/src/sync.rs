//! Presence reconciliation over tables and diffs.
//!
//! These are pure functions: each call takes the previously known table plus
//! either an authoritative snapshot ([`sync_state_with`]) or an explicit
//! join/leave delta ([`sync_diff_with`]) and returns the new canonical table,
//! invoking the supplied hooks for every affected key. Nothing is retained
//! between calls and caller-owned inputs are never mutated — immutability is
//! enforced by the borrowed parameters, and the result is built by explicit
//! structural copy rather than any serialization round-trip.
//!
//! # Reconciliation rules
//!
//! - Joins are applied strictly before leaves. The ordering is load-bearing:
//!   a key whose metas are fully replaced shows up in both halves of one
//!   diff, and applying the join first lets the leave net out correctly.
//! - Within one key, a newly joined meta supersedes any previously known
//!   meta carrying the same ref; merged entries never hold duplicate refs.
//! - A key is kept in the output table iff it has at least one meta left.
//! - A leave for an absent key or unknown ref is a no-op, not an error.
//!
//! # Example
//!
//! ```
//! use roster::{sync_state, PresenceMeta, PresenceState, PresenceTable};
//!
//! let current: PresenceTable<()> = PresenceTable::new();
//! let mut snapshot = PresenceTable::new();
//! snapshot.insert(
//!     "user:1".to_string(),
//!     PresenceState::new(vec![PresenceMeta::new("r1", ())]),
//! );
//!
//! let table = sync_state(&current, &snapshot);
//! assert_eq!(table.len(), 1);
//! ```

use crate::types::{PresenceDiff, PresenceRef, PresenceState, PresenceTable};
use std::collections::HashSet;

/// Reconcile an authoritative snapshot against the current table.
///
/// Convenience form of [`sync_state_with`] with no-op hooks.
pub fn sync_state<P: Clone>(
    current: &PresenceTable<P>,
    new_state: &PresenceTable<P>,
) -> PresenceTable<P> {
    sync_state_with(
        current,
        new_state,
        |_: &str, _: Option<&PresenceState<P>>, _: &PresenceState<P>| {},
        |_: &str, _: &PresenceState<P>, _: &PresenceState<P>| {},
    )
}

/// Reconcile an authoritative snapshot against the current table, invoking
/// `on_join` / `on_leave` for every key whose metas changed.
///
/// The diff between the two tables is computed from scratch by ref identity
/// and then applied via [`sync_diff_with`]:
///
/// - a key absent from `new_state` leaves entirely;
/// - a key absent from `current` joins entirely;
/// - a key present in both contributes only the metas whose refs appeared
///   (partial join) or disappeared (partial leave), and is omitted from the
///   diff when neither happened.
pub fn sync_state_with<P, J, L>(
    current: &PresenceTable<P>,
    new_state: &PresenceTable<P>,
    on_join: J,
    on_leave: L,
) -> PresenceTable<P>
where
    P: Clone,
    J: FnMut(&str, Option<&PresenceState<P>>, &PresenceState<P>),
    L: FnMut(&str, &PresenceState<P>, &PresenceState<P>),
{
    let mut joins = PresenceTable::new();
    let mut leaves = PresenceTable::new();

    for (key, presence) in current {
        if !new_state.contains_key(key) {
            leaves.insert(key.clone(), presence.clone());
        }
    }

    for (key, new_presence) in new_state {
        match current.get(key) {
            Some(current_presence) => {
                let new_refs: HashSet<&PresenceRef> = new_presence.refs().collect();
                let cur_refs: HashSet<&PresenceRef> = current_presence.refs().collect();

                let joined: Vec<_> = new_presence
                    .metas
                    .iter()
                    .filter(|m| !cur_refs.contains(&m.phx_ref))
                    .cloned()
                    .collect();
                let left: Vec<_> = current_presence
                    .metas
                    .iter()
                    .filter(|m| !new_refs.contains(&m.phx_ref))
                    .cloned()
                    .collect();

                if !joined.is_empty() {
                    joins.insert(key.clone(), PresenceState::new(joined));
                }
                if !left.is_empty() {
                    leaves.insert(key.clone(), PresenceState::new(left));
                }
            }
            None => {
                joins.insert(key.clone(), new_presence.clone());
            }
        }
    }

    sync_diff_with(current, &PresenceDiff { joins, leaves }, on_join, on_leave)
}

/// Apply an explicit join/leave diff to the current table.
///
/// Convenience form of [`sync_diff_with`] with no-op hooks.
pub fn sync_diff<P: Clone>(
    current: &PresenceTable<P>,
    diff: &PresenceDiff<P>,
) -> PresenceTable<P> {
    sync_diff_with(
        current,
        diff,
        |_: &str, _: Option<&PresenceState<P>>, _: &PresenceState<P>| {},
        |_: &str, _: &PresenceState<P>, _: &PresenceState<P>| {},
    )
}

/// Apply an explicit join/leave diff to the current table, invoking
/// `on_join` / `on_leave` per affected key.
///
/// Joins are applied first: the joined metas become the head of the entry,
/// followed by the previously known metas minus any ref the join superseded.
/// `on_join` fires for every join key, with `None` as the previous entry for
/// a brand-new key and the joined entry exactly as it appears in the diff.
///
/// Leaves are applied second: each meta whose ref matches one of the leaving
/// entry's refs is removed, `on_leave` fires with the entry state after
/// removal, and a key whose metas emptied is deleted from the table. A leave
/// for a key not in the table is skipped silently.
///
/// Re-applying the same diff is idempotent with respect to ref identity.
/// Duplicate refs inside a single input `metas` sequence are malformed and
/// the resulting meta order within that entry is unspecified.
pub fn sync_diff_with<P, J, L>(
    current: &PresenceTable<P>,
    diff: &PresenceDiff<P>,
    mut on_join: J,
    mut on_leave: L,
) -> PresenceTable<P>
where
    P: Clone,
    J: FnMut(&str, Option<&PresenceState<P>>, &PresenceState<P>),
    L: FnMut(&str, &PresenceState<P>, &PresenceState<P>),
{
    let mut state = current.clone();

    for (key, joined) in &diff.joins {
        let previous = state.remove(key);

        let mut metas = joined.metas.clone();
        if let Some(previous) = &previous {
            let joined_refs: HashSet<&PresenceRef> = joined.refs().collect();
            metas.extend(
                previous
                    .metas
                    .iter()
                    .filter(|m| !joined_refs.contains(&m.phx_ref))
                    .cloned(),
            );
        }
        state.insert(key.clone(), PresenceState::new(metas));

        on_join(key, previous.as_ref(), joined);
    }

    for (key, left) in &diff.leaves {
        let Some(entry) = state.get_mut(key) else {
            continue;
        };

        let gone: HashSet<&PresenceRef> = left.refs().collect();
        entry.metas.retain(|m| !gone.contains(&m.phx_ref));

        let now_empty = entry.is_empty();
        on_leave(key, entry, left);
        if now_empty {
            state.remove(key);
        }
    }

    state
}

/// Iterate over the table's entries in its enumeration order.
///
/// Restartable and side-effect-free: repeated calls on the same table
/// snapshot yield equal sequences.
pub fn list<P>(table: &PresenceTable<P>) -> impl Iterator<Item = &PresenceState<P>> {
    table.values()
}

/// Iterate over the table, projecting each `(key, entry)` pair through
/// `chooser`.
pub fn list_by<'a, P, R, F>(table: &'a PresenceTable<P>, mut chooser: F) -> impl Iterator<Item = R>
where
    F: FnMut(&'a str, &'a PresenceState<P>) -> R,
{
    table.iter().map(move |(key, entry)| chooser(key, entry))
}
