//! Checklist-item merge: apply one item's field changes in place.
//!
//! Insertion and removal of items is a checklist-level operation; this
//! merge only mutates an item that already exists. An update referencing a
//! missing checklist or item is a benign race (the deletion has not
//! propagated locally yet), not an error.

use std::sync::Arc;

use crate::model::{ChecklistId, ChecklistItem, RunSnapshot};
use crate::update::ItemUpdate;

/// Merge a single item update into the run snapshot.
///
/// Total function: a routing miss, a stale timestamp or a malformed
/// (timestamp-less) update all return the input reference unchanged. On a
/// real merge only the path item → checklist → run is re-allocated; sibling
/// items and checklists keep their `Arc` identity.
#[must_use]
pub fn merge_item(
    current: &Arc<RunSnapshot>,
    checklist_id: &ChecklistId,
    update: &ItemUpdate,
) -> Arc<RunSnapshot> {
    let Some(checklist_pos) = current.checklist_index(checklist_id) else {
        tracing::debug!(
            checklist_id = %checklist_id,
            item_id = %update.id,
            "item update for unknown checklist, ignoring"
        );
        return Arc::clone(current);
    };
    let checklist = &current.checklists[checklist_pos];

    let Some(item_pos) = checklist.item_index(&update.id) else {
        tracing::debug!(
            checklist_id = %checklist_id,
            item_id = %update.id,
            "item update for unknown item, ignoring"
        );
        return Arc::clone(current);
    };

    let Some(updated_item) = apply_item_update(&checklist.items[item_pos], update) else {
        return Arc::clone(current);
    };

    let mut new_checklist = (**checklist).clone();
    new_checklist.items[item_pos] = Arc::new(updated_item);

    let mut run = (**current).clone();
    run.checklists[checklist_pos] = Arc::new(new_checklist);
    Arc::new(run)
}

/// Apply an item update against a held item, honoring the timestamp gate.
///
/// Returns `None` when the update must not be applied: timestamp missing
/// (`<= 0`) or not strictly newer than the held `update_at`.
pub(crate) fn apply_item_update(
    held: &Arc<ChecklistItem>,
    update: &ItemUpdate,
) -> Option<ChecklistItem> {
    if update.checklist_item_updated_at <= 0 {
        tracing::warn!(
            item_id = %update.id,
            "item update without server timestamp, ignoring"
        );
        return None;
    }
    if held.update_at >= update.checklist_item_updated_at {
        tracing::debug!(
            item_id = %update.id,
            held = held.update_at,
            incoming = update.checklist_item_updated_at,
            "stale item update, ignoring"
        );
        return None;
    }

    let mut item = (**held).clone();
    let fields = &update.fields;
    if let Some(title) = &fields.title {
        item.title = title.clone();
    }
    if let Some(description) = &fields.description {
        item.description = description.clone();
    }
    if let Some(state) = fields.state {
        item.state = state;
    }
    if let Some(state_modified) = fields.state_modified {
        item.state_modified = state_modified;
    }
    if let Some(assignee_id) = &fields.assignee_id {
        item.assignee_id = Some(assignee_id.clone());
    }
    if let Some(assignee_modified) = fields.assignee_modified {
        item.assignee_modified = assignee_modified;
    }
    if let Some(command) = &fields.command {
        item.command = command.clone();
    }
    if let Some(command_last_run) = fields.command_last_run {
        item.command_last_run = command_last_run;
    }
    if let Some(due_date) = fields.due_date {
        item.due_date = due_date;
    }
    item.update_at = update.checklist_item_updated_at;
    Some(item)
}
