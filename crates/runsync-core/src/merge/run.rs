//! Whole-run merge: a bulk payload of changed top-level fields.
//!
//! Processing order is deliberately fixed to avoid cross-field
//! inconsistency: deletions first, then scalar overwrites, then the two
//! chronological collections, then nested checklist updates. Top-level
//! scalars carry no individual timestamps and are overwritten
//! unconditionally; the sender only emits whole-run payloads that are
//! already the latest.

use std::collections::HashSet;
use std::sync::Arc;

use crate::merge::checklist::merge_checklist;
use crate::merge::timeline::{merge_chronological, remove_by_id};
use crate::model::{ChecklistId, RunSnapshot};
use crate::update::RunUpdate;

/// Merge a whole-run update into the snapshot.
///
/// Returns the input reference unchanged only when the update is a pure
/// no-op (empty `changed_fields` and no deletions); any other payload
/// produces a new snapshot. Collections untouched by the payload keep
/// their `Arc` identity entry by entry.
#[must_use]
pub fn merge_run(current: &Arc<RunSnapshot>, update: &RunUpdate) -> Arc<RunSnapshot> {
    if update.is_noop() {
        return Arc::clone(current);
    }

    let mut run = (**current).clone();

    if !update.checklist_deletes.is_empty() {
        let doomed: HashSet<&ChecklistId> = update.checklist_deletes.iter().collect();
        run.checklists.retain(|c| !doomed.contains(&c.id));
    }
    remove_by_id(&mut run.timeline_events, &update.timeline_event_deletes);
    remove_by_id(&mut run.status_posts, &update.status_post_deletes);

    if update.playbook_run_updated_at > 0 {
        run.update_at = update.playbook_run_updated_at;
    }

    let fields = &update.changed_fields;
    if let Some(name) = &fields.name {
        run.name = name.clone();
    }
    if let Some(summary) = &fields.summary {
        run.summary = summary.clone();
    }
    if let Some(owner_user_id) = &fields.owner_user_id {
        run.owner_user_id = owner_user_id.clone();
    }
    if let Some(reporter_user_id) = &fields.reporter_user_id {
        run.reporter_user_id = reporter_user_id.clone();
    }
    if let Some(current_status) = fields.current_status {
        run.current_status = current_status;
    }
    if let Some(participant_ids) = &fields.participant_ids {
        run.participant_ids = participant_ids.clone();
    }
    if let Some(end_at) = fields.end_at {
        run.end_at = end_at;
    }
    if let Some(retrospective) = &fields.retrospective {
        run.retrospective = retrospective.clone();
    }
    if let Some(retrospective_published_at) = fields.retrospective_published_at {
        run.retrospective_published_at = retrospective_published_at;
    }

    if let Some(events) = &fields.timeline_events {
        run.timeline_events = merge_chronological(&run.timeline_events, events);
    }
    if let Some(posts) = &fields.status_posts {
        run.status_posts = merge_chronological(&run.status_posts, posts);
    }

    // Nested checklist updates go through the same per-checklist merge as
    // standalone messages, gate included; unknown ids are skipped there.
    if let Some(checklist_updates) = &fields.checklists {
        let mut snapshot = Arc::new(run);
        for checklist_update in checklist_updates {
            snapshot = merge_checklist(&snapshot, checklist_update);
        }
        return snapshot;
    }

    Arc::new(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Checklist, EventId, PostId, RunId, RunStatus, StatusPost, TimelineEvent,
        TimelineEventType, UserId,
    };
    use crate::update::{ChecklistFieldPatch, ChecklistUpdate, RunFieldPatch};

    fn event(id: &str, create_at: i64) -> TimelineEvent {
        TimelineEvent {
            id: EventId::new(id),
            create_at,
            delete_at: 0,
            event_at: create_at,
            event_type: TimelineEventType::StatusUpdated,
            summary: String::new(),
            details: String::new(),
            post_id: PostId::new(""),
            subject_user_id: UserId::new("user_1"),
            creator_user_id: UserId::new("user_1"),
        }
    }

    fn snapshot() -> Arc<RunSnapshot> {
        Arc::new(RunSnapshot {
            id: RunId::new("run_123"),
            name: "Test Run".to_string(),
            owner_user_id: UserId::new("user_1"),
            current_status: RunStatus::InProgress,
            update_at: 1000,
            checklists: vec![Arc::new(Checklist {
                id: ChecklistId::new("checklist_1"),
                title: "Test Checklist".to_string(),
                items: Vec::new(),
                update_at: 1000,
            })],
            timeline_events: vec![Arc::new(event("e1", 1000))],
            status_posts: vec![Arc::new(StatusPost {
                id: PostId::new("p1"),
                status: RunStatus::InProgress,
                create_at: 1000,
                delete_at: 0,
            })],
            ..RunSnapshot::default()
        })
    }

    #[test]
    fn scalar_overwrite_leaves_collections_shared() {
        let current = snapshot();
        let update = RunUpdate {
            id: RunId::new("run_123"),
            playbook_run_updated_at: 2000,
            changed_fields: RunFieldPatch {
                name: Some("Renamed".to_string()),
                owner_user_id: Some(UserId::new("user_2")),
                ..RunFieldPatch::default()
            },
            ..RunUpdate::default()
        };
        let merged = merge_run(&current, &update);

        assert_eq!(merged.name, "Renamed");
        assert_eq!(merged.owner_user_id, UserId::new("user_2"));
        assert_eq!(merged.update_at, 2000);
        assert!(Arc::ptr_eq(&merged.checklists[0], &current.checklists[0]));
        assert!(Arc::ptr_eq(
            &merged.timeline_events[0],
            &current.timeline_events[0]
        ));
    }

    #[test]
    fn empty_update_returns_input_reference() {
        let current = snapshot();
        let update = RunUpdate {
            id: RunId::new("run_123"),
            playbook_run_updated_at: 2000,
            ..RunUpdate::default()
        };
        let merged = merge_run(&current, &update);
        assert!(Arc::ptr_eq(&merged, &current));
    }

    #[test]
    fn timeline_batch_merges_sorted_and_unique() {
        let current = snapshot();
        let update = RunUpdate {
            id: RunId::new("run_123"),
            changed_fields: RunFieldPatch {
                timeline_events: Some(vec![
                    event("e3", 3000),
                    event("e2", 500),
                    // Replaces the held e1 record wholesale.
                    TimelineEvent {
                        summary: "revised".to_string(),
                        ..event("e1", 1000)
                    },
                ]),
                ..RunFieldPatch::default()
            },
            ..RunUpdate::default()
        };
        let merged = merge_run(&current, &update);

        let ids: Vec<&str> = merged
            .timeline_events
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, ["e2", "e1", "e3"]);
        assert_eq!(merged.timeline_events[1].summary, "revised");

        // Same batch again: identical value.
        let again = merge_run(&merged, &update);
        assert_eq!(again.timeline_events, merged.timeline_events);
    }

    #[test]
    fn status_posts_merge_like_timeline_events() {
        let current = snapshot();
        let update = RunUpdate {
            id: RunId::new("run_123"),
            changed_fields: RunFieldPatch {
                status_posts: Some(vec![StatusPost {
                    id: PostId::new("p2"),
                    status: RunStatus::Finished,
                    create_at: 2000,
                    delete_at: 0,
                }]),
                ..RunFieldPatch::default()
            },
            ..RunUpdate::default()
        };
        let merged = merge_run(&current, &update);
        assert_eq!(merged.status_posts.len(), 2);
        assert_eq!(merged.status_posts[1].id, PostId::new("p2"));
    }

    #[test]
    fn bulk_checklist_updates_route_through_checklist_merge() {
        let current = snapshot();
        let update = RunUpdate {
            id: RunId::new("run_123"),
            changed_fields: RunFieldPatch {
                checklists: Some(vec![
                    ChecklistUpdate {
                        id: ChecklistId::new("checklist_1"),
                        checklist_updated_at: 2000,
                        fields: Some(ChecklistFieldPatch {
                            title: Some("Bulk Renamed".to_string()),
                        }),
                        ..ChecklistUpdate::default()
                    },
                    // Unknown id: skipped without error.
                    ChecklistUpdate {
                        id: ChecklistId::new("unknown"),
                        checklist_updated_at: 2000,
                        ..ChecklistUpdate::default()
                    },
                ]),
                ..RunFieldPatch::default()
            },
            ..RunUpdate::default()
        };
        let merged = merge_run(&current, &update);
        assert_eq!(merged.checklists.len(), 1);
        assert_eq!(merged.checklists[0].title, "Bulk Renamed");
        assert_eq!(merged.checklists[0].update_at, 2000);
    }

    #[test]
    fn deletions_apply_before_changed_fields() {
        let current = snapshot();
        let update = RunUpdate {
            id: RunId::new("run_123"),
            checklist_deletes: vec![ChecklistId::new("checklist_1")],
            timeline_event_deletes: vec![EventId::new("e1")],
            status_post_deletes: vec![PostId::new("p1")],
            ..RunUpdate::default()
        };
        let merged = merge_run(&current, &update);
        assert!(merged.checklists.is_empty());
        assert!(merged.timeline_events.is_empty());
        assert!(merged.status_posts.is_empty());
    }

    #[test]
    fn zero_timestamp_preserves_held_update_at() {
        let current = snapshot();
        let update = RunUpdate {
            id: RunId::new("run_123"),
            playbook_run_updated_at: 0,
            changed_fields: RunFieldPatch {
                name: Some("Renamed".to_string()),
                ..RunFieldPatch::default()
            },
            ..RunUpdate::default()
        };
        let merged = merge_run(&current, &update);
        assert_eq!(merged.update_at, 1000);
        assert_eq!(merged.name, "Renamed");
    }
}
