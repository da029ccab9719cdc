//! End-to-end scenarios: raw channel JSON in, merged snapshots out.
//!
//! These mirror the message flow a connected client sees, decoding each
//! payload with the wire types and applying the matching merge function.

use std::sync::Arc;

use runsync_core::model::{
    Checklist, ChecklistId, ChecklistItem, ItemId, ItemState, RunId, RunSnapshot, UserId,
};
use runsync_core::update::{ChecklistUpdateMessage, ItemUpdateMessage, RunUpdate};
use runsync_core::{merge_checklist, merge_item, merge_run};

fn seed_snapshot() -> Arc<RunSnapshot> {
    Arc::new(RunSnapshot {
        id: RunId::new("run_123"),
        name: "Test Run".to_string(),
        owner_user_id: UserId::new("user_1"),
        create_at: 1000,
        update_at: 1000,
        checklists: vec![Arc::new(Checklist {
            id: ChecklistId::new("checklist_1"),
            title: "Test Checklist".to_string(),
            items: vec![Arc::new(ChecklistItem {
                id: ItemId::new("item_1"),
                title: "Test Item".to_string(),
                state: ItemState::Open,
                update_at: 1000,
                ..ChecklistItem::default()
            })],
            update_at: 1000,
        })],
        ..RunSnapshot::default()
    })
}

#[test]
fn incremental_rename_over_the_wire() {
    let current = seed_snapshot();
    let update = RunUpdate::from_json(
        r#"{
            "id": "run_123",
            "playbook_run_updated_at": 2000,
            "changed_fields": {"name": "Updated Name", "owner_user_id": "user_2"}
        }"#,
    )
    .expect("decode");

    let merged = merge_run(&current, &update);
    assert_eq!(merged.name, "Updated Name");
    assert_eq!(merged.owner_user_id, UserId::new("user_2"));
    assert_eq!(merged.id, RunId::new("run_123"));
    // Untouched collections stay shared.
    assert!(Arc::ptr_eq(&merged.checklists[0], &current.checklists[0]));
}

#[test]
fn checklist_title_update_preserves_items() {
    let current = seed_snapshot();
    let msg = ChecklistUpdateMessage::from_json(
        r#"{
            "playbook_run_id": "run_123",
            "update": {
                "id": "checklist_1",
                "index": 0,
                "checklist_updated_at": 2000,
                "fields": {"title": "Updated Checklist Title"}
            }
        }"#,
    )
    .expect("decode");

    let merged = merge_checklist(&current, &msg.update);
    assert_eq!(merged.checklists[0].title, "Updated Checklist Title");
    assert_eq!(merged.checklists[0].items.len(), 1);
}

#[test]
fn item_close_then_stale_reopen() {
    let current = seed_snapshot();
    let close = ItemUpdateMessage::from_json(
        r#"{
            "playbook_run_id": "run_123",
            "checklist_id": "checklist_1",
            "update": {
                "id": "item_1",
                "index": 0,
                "checklist_item_updated_at": 2000,
                "fields": {"state": "closed"}
            }
        }"#,
    )
    .expect("decode");

    let closed = merge_item(&current, &close.checklist_id, &close.update);
    assert_eq!(closed.checklists[0].items[0].state, ItemState::Closed);
    assert_eq!(closed.checklists[0].items[0].update_at, 2000);

    // Redelivery: reference-identical result.
    let again = merge_item(&closed, &close.checklist_id, &close.update);
    assert!(Arc::ptr_eq(&again, &closed));

    // A late reopen carrying an older timestamp loses.
    let reopen = ItemUpdateMessage::from_json(
        r#"{
            "playbook_run_id": "run_123",
            "checklist_id": "checklist_1",
            "update": {
                "id": "item_1",
                "index": 0,
                "checklist_item_updated_at": 1500,
                "fields": {"state": ""}
            }
        }"#,
    )
    .expect("decode");
    let result = merge_item(&closed, &reopen.checklist_id, &reopen.update);
    assert!(Arc::ptr_eq(&result, &closed));
    assert_eq!(result.checklists[0].items[0].state, ItemState::Closed);
}

#[test]
fn insert_message_redelivered_once_keeps_two_items() {
    let current = seed_snapshot();
    let raw = r#"{
        "playbook_run_id": "run_123",
        "update": {
            "id": "checklist_1",
            "index": 0,
            "checklist_updated_at": 2000,
            "item_inserts": [{"id": "item_2", "title": "New Item"}]
        }
    }"#;
    let msg = ChecklistUpdateMessage::from_json(raw).expect("decode");

    let merged = merge_checklist(&current, &msg.update);
    assert_eq!(merged.checklists[0].items.len(), 2);

    let redelivered = ChecklistUpdateMessage::from_json(raw).expect("decode");
    let again = merge_checklist(&merged, &redelivered.update);
    assert_eq!(again.checklists[0].items.len(), 2);
}

#[test]
fn misrouted_messages_leave_snapshot_untouched() {
    let current = seed_snapshot();

    let msg = ItemUpdateMessage::from_json(
        r#"{
            "playbook_run_id": "run_123",
            "checklist_id": "unknown_checklist",
            "update": {
                "id": "item_1",
                "index": 0,
                "checklist_item_updated_at": 2000,
                "fields": {"state": "closed"}
            }
        }"#,
    )
    .expect("decode");
    let result = merge_item(&current, &msg.checklist_id, &msg.update);
    assert!(Arc::ptr_eq(&result, &current));

    let msg = ChecklistUpdateMessage::from_json(
        r#"{
            "playbook_run_id": "run_123",
            "update": {
                "id": "unknown_checklist",
                "index": 0,
                "checklist_updated_at": 2000,
                "fields": {"title": "Updated Title"}
            }
        }"#,
    )
    .expect("decode");
    let result = merge_checklist(&current, &msg.update);
    assert!(Arc::ptr_eq(&result, &current));
}
