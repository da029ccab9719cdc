//! The run snapshot: one live playbook run as held by a client.
//!
//! A snapshot is immutable once built. The merge engine never mutates a
//! snapshot in place; it returns a fresh `Arc<RunSnapshot>` sharing every
//! untouched sub-entity with the input. Callers swap the new reference in
//! atomically and can rely on pointer equality to detect "nothing changed".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::checklist::Checklist;
use super::ids::{ChecklistId, EventId, PostId, RunId, UserId};

/// Lifecycle status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RunStatus {
    #[default]
    InProgress,
    Finished,
}

impl RunStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "InProgress",
            Self::Finished => "Finished",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of timeline event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineEventType {
    RunCreated,
    StatusUpdated,
    OwnerChanged,
    TaskStateModified,
    AssigneeChanged,
    RanSlashCommand,
    EventFromPost,
    RunFinished,
    RunRestored,
    StatusUpdateRequested,
}

/// One entry in the run's timeline.
///
/// Immutable once created; an event arriving again under the same id
/// replaces the prior record wholesale rather than duplicating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: EventId,
    pub create_at: i64,
    pub delete_at: i64,
    /// When the described thing actually happened (may predate `create_at`).
    pub event_at: i64,
    pub event_type: TimelineEventType,
    pub summary: String,
    pub details: String,
    pub post_id: PostId,
    pub subject_user_id: UserId,
    pub creator_user_id: UserId,
}

/// A posted status update, kept on the run for the status timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StatusPost {
    pub id: PostId,
    pub status: RunStatus,
    pub create_at: i64,
    pub delete_at: i64,
}

/// The root entity: a full local snapshot of one playbook run.
///
/// Top-level scalar fields carry no individual timestamps and are always
/// overwritten unconditionally by a whole-run merge; the nested checklists
/// and items gate themselves on their own `update_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RunSnapshot {
    pub id: RunId,
    pub name: String,
    pub summary: String,
    pub owner_user_id: UserId,
    pub reporter_user_id: UserId,
    pub team_id: String,
    pub channel_id: String,
    pub playbook_id: String,
    pub current_status: RunStatus,
    pub participant_ids: Vec<UserId>,
    pub create_at: i64,
    pub end_at: i64,
    /// Server timestamp of the newest whole-run payload seen, epoch millis.
    pub update_at: i64,
    pub retrospective: String,
    pub retrospective_published_at: i64,
    /// Display order is meaningful and preserved by index across merges.
    pub checklists: Vec<Arc<Checklist>>,
    /// Always materialized sorted ascending by `(create_at, id)`.
    pub timeline_events: Vec<Arc<TimelineEvent>>,
    /// Same ordering contract as `timeline_events`.
    pub status_posts: Vec<Arc<StatusPost>>,
}

impl RunSnapshot {
    /// Position of a checklist within this run, by identifier.
    #[must_use]
    pub fn checklist_index(&self, id: &ChecklistId) -> Option<usize> {
        self.checklists.iter().position(|c| c.id == *id)
    }

    /// Look up a checklist by identifier.
    #[must_use]
    pub fn checklist(&self, id: &ChecklistId) -> Option<&Arc<Checklist>> {
        self.checklists.iter().find(|c| c.id == *id)
    }
}
