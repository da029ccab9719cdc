//! Checklist merge: one checklist's field changes plus item membership
//! changes, applied atomically under a single server timestamp.
//!
//! The apply order inside a checklist is fixed to avoid index-shifting
//! bugs: scalar fields, then updates to existing items, then deletions,
//! then de-duplicated insertions, then reordering. The checklist's
//! `update_at` gate makes the whole bundle idempotent: a redelivered or
//! out-of-date message is rejected before anything is touched.
//!
//! This merge never creates or destroys a checklist; lifecycle is a
//! whole-run concern.

use std::collections::HashSet;
use std::sync::Arc;

use crate::merge::item::apply_item_update;
use crate::model::{Checklist, ChecklistItem, ItemId, RunSnapshot};
use crate::update::ChecklistUpdate;

/// Merge a single checklist update into the run snapshot.
///
/// Total function: an unknown checklist id, a stale timestamp or a
/// malformed (timestamp-less) update returns the input reference
/// unchanged. On a real merge exactly one checklist is replaced at its
/// original index; siblings and all other run fields keep `Arc` identity.
#[must_use]
pub fn merge_checklist(current: &Arc<RunSnapshot>, update: &ChecklistUpdate) -> Arc<RunSnapshot> {
    let Some(index) = current.checklist_index(&update.id) else {
        tracing::debug!(
            checklist_id = %update.id,
            "checklist update for unknown checklist, ignoring"
        );
        return Arc::clone(current);
    };

    if update.checklist_updated_at <= 0 {
        tracing::warn!(
            checklist_id = %update.id,
            "checklist update without server timestamp, ignoring"
        );
        return Arc::clone(current);
    }

    let held = &current.checklists[index];
    if held.update_at >= update.checklist_updated_at {
        tracing::debug!(
            checklist_id = %update.id,
            held = held.update_at,
            incoming = update.checklist_updated_at,
            "stale checklist update, ignoring"
        );
        return Arc::clone(current);
    }

    let merged = apply_to_checklist(held, update);

    let mut run = (**current).clone();
    run.checklists[index] = Arc::new(merged);
    Arc::new(run)
}

/// Apply an already-gated update to a held checklist.
///
/// Caller has verified the timestamp gate; this always produces a new
/// checklist value with `update_at` advanced.
fn apply_to_checklist(held: &Checklist, update: &ChecklistUpdate) -> Checklist {
    let mut checklist = held.clone();

    if let Some(fields) = &update.fields
        && let Some(title) = &fields.title
    {
        checklist.title = title.clone();
    }

    for item_update in &update.item_updates {
        let Some(pos) = checklist.item_index(&item_update.id) else {
            tracing::debug!(
                checklist_id = %update.id,
                item_id = %item_update.id,
                "bundled item update for unknown item, skipping"
            );
            continue;
        };
        if let Some(updated) = apply_item_update(&checklist.items[pos], item_update) {
            checklist.items[pos] = Arc::new(updated);
        }
    }

    if !update.item_deletes.is_empty() {
        let doomed: HashSet<&ItemId> = update.item_deletes.iter().collect();
        checklist.items.retain(|item| !doomed.contains(&item.id));
    }

    // Appends skip ids already present after deletion, which also
    // de-duplicates ids repeated within the payload itself.
    for insert in &update.item_inserts {
        if checklist.contains_item(&insert.id) {
            tracing::debug!(
                checklist_id = %update.id,
                item_id = %insert.id,
                "redelivered item insert, skipping"
            );
        } else {
            checklist.items.push(Arc::new(insert.clone()));
        }
    }

    if let Some(order) = &update.items_order {
        checklist.items = reorder_items(checklist.items, order);
    }

    checklist.update_at = update.checklist_updated_at;
    checklist
}

/// Rebuild the item list in the order given by `order`; items missing from
/// the order list keep their relative order at the tail. Ids in `order`
/// with no matching item are skipped.
fn reorder_items(items: Vec<Arc<ChecklistItem>>, order: &[ItemId]) -> Vec<Arc<ChecklistItem>> {
    let mut slots: Vec<Option<Arc<ChecklistItem>>> = items.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(slots.len());

    for id in order {
        let found = slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|item| item.id == *id));
        if let Some(pos) = found
            && let Some(item) = slots[pos].take()
        {
            ordered.push(item);
        }
    }
    ordered.extend(slots.into_iter().flatten());
    ordered
}
