//! Snapshot data model: runs, checklists, items, timeline events.

pub mod checklist;
pub mod ids;
pub mod run;

pub use checklist::{Checklist, ChecklistItem, ItemState};
pub use ids::{ChecklistId, EventId, ItemId, PostId, RunId, UserId};
pub use run::{RunSnapshot, RunStatus, StatusPost, TimelineEvent, TimelineEventType};
