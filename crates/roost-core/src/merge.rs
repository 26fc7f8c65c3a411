//! Snapshot merge used by import
//!
//! Combines the device's current state with an incoming snapshot by id
//! presence only: current rows win on id collision, incoming rows the device
//! has never seen are appended. No field-level or timestamp comparison
//! happens on collision; offline capture tools want merge results an
//! operator can predict, and the pending queue already records what this
//! device still has to upload.

use indexmap::IndexMap;

use crate::models::{Logs, Snapshot};

/// Merge `incoming` into `current`, current side winning on id collisions
///
/// Ordering is deterministic: all current rows in their original order, then
/// unseen incoming rows in theirs. Scalar fields keep the current value;
/// `selected_flock_id` and `last_sync_at` fall back to the incoming value
/// only when the current one is unset. The farm name is never taken from an
/// import.
pub fn merge_snapshots(current: Snapshot, incoming: Snapshot) -> Snapshot {
    Snapshot {
        farm_name: current.farm_name,
        users: merge_by_id(current.users, incoming.users, |u| &u.id),
        flocks: merge_by_id(current.flocks, incoming.flocks, |f| &f.id),
        logs: Logs {
            feed: merge_by_id(current.logs.feed, incoming.logs.feed, |l| &l.id),
            mortality: merge_by_id(current.logs.mortality, incoming.logs.mortality, |l| &l.id),
            eggs: merge_by_id(current.logs.eggs, incoming.logs.eggs, |l| &l.id),
            treatments: merge_by_id(current.logs.treatments, incoming.logs.treatments, |l| &l.id),
            environment: merge_by_id(current.logs.environment, incoming.logs.environment, |l| {
                &l.id
            }),
        },
        pending_queue: merge_by_id(current.pending_queue, incoming.pending_queue, |p| &p.id),
        selected_flock_id: current.selected_flock_id.or(incoming.selected_flock_id),
        last_sync_at: current.last_sync_at.or(incoming.last_sync_at),
    }
}

/// Id-presence merge of one collection
///
/// The map is insertion-ordered; inserting all current rows first makes them
/// win collisions and keeps their relative order ahead of appended rows.
fn merge_by_id<T, F>(current: Vec<T>, incoming: Vec<T>, id: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut merged: IndexMap<String, T> = IndexMap::with_capacity(current.len() + incoming.len());
    for item in current {
        merged.insert(id(&item).to_string(), item);
    }
    for item in incoming {
        merged.entry(id(&item).to_string()).or_insert(item);
    }
    merged.into_values().collect()
}
