//! Union-merge for the run's id-keyed, creation-time-ordered collections
//! (timeline events and status posts).
//!
//! A merge is always safe: union the incoming entries into the held set
//! keyed by id (incoming entry wins for a repeated id), then re-sort the
//! full result ascending by `(create_at, id)`. The id tiebreaker keeps the
//! order deterministic when two entries share a creation time. Re-applying
//! the same batch produces the same sorted result, so redelivery is a
//! value-level no-op.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use crate::model::{EventId, PostId, StatusPost, TimelineEvent};

/// An entry that lives in one of the run's chronological collections.
pub(crate) trait Chronological {
    type Id: Ord + Hash + Eq + Clone;

    fn id(&self) -> &Self::Id;
    fn create_at(&self) -> i64;
}

impl Chronological for TimelineEvent {
    type Id = EventId;

    fn id(&self) -> &EventId {
        &self.id
    }

    fn create_at(&self) -> i64 {
        self.create_at
    }
}

impl Chronological for StatusPost {
    type Id = PostId;

    fn id(&self) -> &PostId {
        &self.id
    }

    fn create_at(&self) -> i64 {
        self.create_at
    }
}

/// Union `incoming` into `existing` keyed by id, incoming entry winning,
/// and return the full set sorted ascending by `(create_at, id)`.
///
/// Entries untouched by the update keep their `Arc` identity.
pub(crate) fn merge_chronological<T: Chronological + Clone>(
    existing: &[Arc<T>],
    incoming: &[T],
) -> Vec<Arc<T>> {
    let mut by_id: HashMap<T::Id, Arc<T>> =
        HashMap::with_capacity(existing.len() + incoming.len());
    for entry in existing {
        by_id.insert(entry.id().clone(), Arc::clone(entry));
    }
    for entry in incoming {
        by_id.insert(entry.id().clone(), Arc::new(entry.clone()));
    }

    let mut merged: Vec<Arc<T>> = by_id.into_values().collect();
    merged.sort_by(|a, b| {
        a.create_at()
            .cmp(&b.create_at())
            .then_with(|| a.id().cmp(b.id()))
    });
    merged
}

/// Drop every entry whose id appears in `deletes`.
pub(crate) fn remove_by_id<T: Chronological>(entries: &mut Vec<Arc<T>>, deletes: &[T::Id]) {
    if deletes.is_empty() {
        return;
    }
    let doomed: HashSet<&T::Id> = deletes.iter().collect();
    entries.retain(|entry| !doomed.contains(entry.id()));
}
