//! Deterministic workload generation: a seed snapshot plus a script of
//! update messages with strictly increasing server timestamps.
//!
//! The generator keeps a reference snapshot up to date by applying each
//! generated message through the real merge engine, so deletions, updates
//! and reorders always target entities that exist at that point in the
//! script. Item updates carry full field patches, which is what makes the
//! per-stream workload insensitive to cross-stream interleaving.

use std::sync::Arc;

use runsync_core::model::{
    Checklist, ChecklistId, ChecklistItem, EventId, ItemId, ItemState, PostId, RunId, RunSnapshot,
    RunStatus, StatusPost, TimelineEvent, TimelineEventType, UserId,
};
use runsync_core::update::{
    ChecklistFieldPatch, ChecklistUpdate, ChecklistUpdateMessage, ItemFieldPatch, ItemUpdate,
    ItemUpdateMessage, RunFieldPatch, RunUpdate,
};

use crate::apply_message;
use crate::channel::ChannelMessage;
use crate::rng::DeterministicRng;

/// One scripted send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptStep {
    /// Tick at which the sender emits this message.
    pub send_at_tick: u64,
    pub message: ChannelMessage,
}

/// A generated scenario: where every replica starts, and what the channel
/// will carry.
#[derive(Debug, Clone)]
pub struct Workload {
    pub seed_snapshot: Arc<RunSnapshot>,
    pub script: Vec<ScriptStep>,
}

/// Millisecond timestamp of the seed snapshot's entities.
const SEED_AT: i64 = 10_000;

/// Spacing between consecutive server timestamps in the script.
const STEP_AT: i64 = 250;

fn seed_snapshot() -> Arc<RunSnapshot> {
    let checklists = (0..3)
        .map(|k| {
            let items = (0..4)
                .map(|j| {
                    Arc::new(ChecklistItem {
                        id: ItemId::new(format!("task_{k}_{j}")),
                        title: format!("Task {k}.{j}"),
                        update_at: SEED_AT,
                        ..ChecklistItem::default()
                    })
                })
                .collect();
            Arc::new(Checklist {
                id: ChecklistId::new(format!("checklist_{k}")),
                title: format!("Checklist {k}"),
                items,
                update_at: SEED_AT,
            })
        })
        .collect();

    Arc::new(RunSnapshot {
        id: RunId::new("run_0"),
        name: "Seed Run".to_string(),
        owner_user_id: UserId::new("user_0"),
        current_status: RunStatus::InProgress,
        create_at: SEED_AT,
        update_at: SEED_AT,
        checklists,
        ..RunSnapshot::default()
    })
}

/// Generate a scenario of `steps` messages spread over `ticks` ticks.
#[must_use]
pub fn generate(seed: u64, ticks: u64, steps: usize) -> Workload {
    let mut rng = DeterministicRng::new(seed);
    let mut reference = seed_snapshot();
    let mut script = Vec::with_capacity(steps);

    for step in 0..steps {
        let at = SEED_AT + STEP_AT * (i64::try_from(step).unwrap_or(0) + 1);
        let message = next_message(&reference, &mut rng, step, at);
        reference = apply_message(&reference, &message);
        let send_at_tick = if ticks == 0 {
            0
        } else {
            rng.next_bounded(ticks)
        };
        script.push(ScriptStep {
            send_at_tick,
            message,
        });
    }
    script.sort_by_key(|step| step.send_at_tick);

    Workload {
        seed_snapshot: seed_snapshot(),
        script,
    }
}

fn next_message(
    reference: &Arc<RunSnapshot>,
    rng: &mut DeterministicRng,
    step: usize,
    at: i64,
) -> ChannelMessage {
    match rng.next_bounded(8) {
        0 => rename_run(step, at),
        1 => change_status(step, at),
        2 => append_timeline_event(step, at),
        3 => retitle_checklist(reference, rng, at),
        4 => insert_item(reference, rng, step, at),
        5 => delete_item(reference, rng, at),
        6 => reorder_items(reference, rng, at),
        _ => update_item(reference, rng, step, at),
    }
}

fn rename_run(step: usize, at: i64) -> ChannelMessage {
    ChannelMessage::Run(RunUpdate {
        id: RunId::new("run_0"),
        playbook_run_updated_at: at,
        changed_fields: RunFieldPatch {
            name: Some(format!("Run rename {step}")),
            ..RunFieldPatch::default()
        },
        ..RunUpdate::default()
    })
}

fn change_status(step: usize, at: i64) -> ChannelMessage {
    let status = if step % 2 == 0 {
        RunStatus::Finished
    } else {
        RunStatus::InProgress
    };
    ChannelMessage::Run(RunUpdate {
        id: RunId::new("run_0"),
        playbook_run_updated_at: at,
        changed_fields: RunFieldPatch {
            current_status: Some(status),
            status_posts: Some(vec![StatusPost {
                id: PostId::new(format!("post_{step}")),
                status,
                create_at: at,
                delete_at: 0,
            }]),
            ..RunFieldPatch::default()
        },
        ..RunUpdate::default()
    })
}

fn append_timeline_event(step: usize, at: i64) -> ChannelMessage {
    ChannelMessage::Run(RunUpdate {
        id: RunId::new("run_0"),
        playbook_run_updated_at: at,
        changed_fields: RunFieldPatch {
            timeline_events: Some(vec![TimelineEvent {
                id: EventId::new(format!("event_{step}")),
                create_at: at,
                delete_at: 0,
                event_at: at,
                event_type: TimelineEventType::StatusUpdated,
                summary: format!("Step {step}"),
                details: String::new(),
                post_id: PostId::new(""),
                subject_user_id: UserId::new("user_0"),
                creator_user_id: UserId::new("user_0"),
            }]),
            ..RunFieldPatch::default()
        },
        ..RunUpdate::default()
    })
}

fn pick_checklist(reference: &Arc<RunSnapshot>, rng: &mut DeterministicRng) -> Arc<Checklist> {
    let pick = rng
        .pick_index(reference.checklists.len())
        .unwrap_or_default();
    Arc::clone(&reference.checklists[pick])
}

fn retitle_checklist(
    reference: &Arc<RunSnapshot>,
    rng: &mut DeterministicRng,
    at: i64,
) -> ChannelMessage {
    let checklist = pick_checklist(reference, rng);
    ChannelMessage::Checklist(ChecklistUpdateMessage {
        playbook_run_id: reference.id.clone(),
        update: ChecklistUpdate {
            id: checklist.id.clone(),
            checklist_updated_at: at,
            fields: Some(ChecklistFieldPatch {
                title: Some(format!("{} (at {at})", checklist.title)),
            }),
            ..ChecklistUpdate::default()
        },
    })
}

fn insert_item(
    reference: &Arc<RunSnapshot>,
    rng: &mut DeterministicRng,
    step: usize,
    at: i64,
) -> ChannelMessage {
    let checklist = pick_checklist(reference, rng);
    ChannelMessage::Checklist(ChecklistUpdateMessage {
        playbook_run_id: reference.id.clone(),
        update: ChecklistUpdate {
            id: checklist.id.clone(),
            checklist_updated_at: at,
            item_inserts: vec![ChecklistItem {
                id: ItemId::new(format!("task_new_{step}")),
                title: format!("Inserted at step {step}"),
                update_at: at,
                ..ChecklistItem::default()
            }],
            ..ChecklistUpdate::default()
        },
    })
}

fn delete_item(
    reference: &Arc<RunSnapshot>,
    rng: &mut DeterministicRng,
    at: i64,
) -> ChannelMessage {
    let checklist = pick_checklist(reference, rng);
    let deletes = rng
        .pick_index(checklist.items.len())
        .map(|pick| vec![checklist.items[pick].id.clone()])
        .unwrap_or_default();
    ChannelMessage::Checklist(ChecklistUpdateMessage {
        playbook_run_id: reference.id.clone(),
        update: ChecklistUpdate {
            id: checklist.id.clone(),
            checklist_updated_at: at,
            item_deletes: deletes,
            ..ChecklistUpdate::default()
        },
    })
}

fn reorder_items(
    reference: &Arc<RunSnapshot>,
    rng: &mut DeterministicRng,
    at: i64,
) -> ChannelMessage {
    let checklist = pick_checklist(reference, rng);
    let mut order: Vec<ItemId> = checklist.items.iter().map(|i| i.id.clone()).collect();
    for k in (1..order.len()).rev() {
        if let Some(swap_with) = rng.pick_index(k + 1) {
            order.swap(k, swap_with);
        }
    }
    ChannelMessage::Checklist(ChecklistUpdateMessage {
        playbook_run_id: reference.id.clone(),
        update: ChecklistUpdate {
            id: checklist.id.clone(),
            checklist_updated_at: at,
            items_order: Some(order),
            ..ChecklistUpdate::default()
        },
    })
}

fn update_item(
    reference: &Arc<RunSnapshot>,
    rng: &mut DeterministicRng,
    step: usize,
    at: i64,
) -> ChannelMessage {
    let checklist = pick_checklist(reference, rng);
    let Some(pick) = rng.pick_index(checklist.items.len()) else {
        // Checklist emptied by earlier deletes; fall back to a retitle.
        return retitle_checklist(reference, rng, at);
    };
    let item = &checklist.items[pick];
    let state = match rng.next_bounded(4) {
        0 => ItemState::Open,
        1 => ItemState::InProgress,
        2 => ItemState::Closed,
        _ => ItemState::Skipped,
    };
    ChannelMessage::Item(ItemUpdateMessage {
        playbook_run_id: reference.id.clone(),
        checklist_id: checklist.id.clone(),
        update: ItemUpdate {
            id: item.id.clone(),
            index: pick,
            checklist_item_updated_at: at,
            // Full patch: the newest timestamp fully determines the item.
            fields: ItemFieldPatch {
                title: Some(item.title.clone()),
                description: Some(format!("updated at step {step}")),
                state: Some(state),
                state_modified: Some(at),
                assignee_id: Some(UserId::new(format!("user_{}", rng.next_bounded(5)))),
                assignee_modified: Some(at),
                command: Some(String::new()),
                command_last_run: Some(0),
                due_date: Some(at + 86_400_000),
            },
        },
    })
}
