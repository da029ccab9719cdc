//! Wire shapes for incremental update messages.
//!
//! These are the payloads the push channel delivers, one message per inbound
//! websocket event. Field names match the server's snake_case JSON, so a raw
//! payload string decodes straight into the typed message.
//!
//! Patches are structs of `Option<T>` per legal field rather than loose
//! name/value maps: the set of patchable fields is closed at compile time,
//! and a field absent from the payload deserializes to `None`.
//!
//! Timestamps are mandatory. A message whose `*_updated_at` is missing or
//! zero is treated as malformed by the merge engine (logged and ignored);
//! this crate never synthesizes a local wall-clock value, since a local
//! clock is not comparable to server-issued timestamps.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    ChecklistId, ChecklistItem, EventId, ItemId, ItemState, PostId, RunId, RunStatus, StatusPost,
    TimelineEvent, UserId,
};

/// Error returned when a raw channel payload does not decode.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid JSON for {message_type}: {source}")]
    Json {
        message_type: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Whole-run update
// ---------------------------------------------------------------------------

/// Changed top-level fields of a run, plus the two nested bulk payloads.
///
/// `checklists` entries reuse [`ChecklistUpdate`] and go through the same
/// per-checklist merge (including its timestamp gate) as a standalone
/// checklist message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RunFieldPatch {
    pub name: Option<String>,
    pub summary: Option<String>,
    pub owner_user_id: Option<UserId>,
    pub reporter_user_id: Option<UserId>,
    pub current_status: Option<RunStatus>,
    pub participant_ids: Option<Vec<UserId>>,
    pub end_at: Option<i64>,
    pub retrospective: Option<String>,
    pub retrospective_published_at: Option<i64>,
    pub timeline_events: Option<Vec<TimelineEvent>>,
    pub status_posts: Option<Vec<StatusPost>>,
    pub checklists: Option<Vec<ChecklistUpdate>>,
}

impl RunFieldPatch {
    /// True when no field, nested or scalar, is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.summary.is_none()
            && self.owner_user_id.is_none()
            && self.reporter_user_id.is_none()
            && self.current_status.is_none()
            && self.participant_ids.is_none()
            && self.end_at.is_none()
            && self.retrospective.is_none()
            && self.retrospective_published_at.is_none()
            && self.timeline_events.is_none()
            && self.status_posts.is_none()
            && self.checklists.is_none()
    }
}

/// A whole-run incremental update message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RunUpdate {
    pub id: RunId,
    /// Server timestamp of the payload, epoch millis.
    pub playbook_run_updated_at: i64,
    pub changed_fields: RunFieldPatch,
    pub checklist_deletes: Vec<ChecklistId>,
    pub timeline_event_deletes: Vec<EventId>,
    pub status_post_deletes: Vec<PostId>,
}

impl RunUpdate {
    /// Decode a raw channel payload.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Json`] when the payload is not valid JSON for
    /// this message shape.
    pub fn from_json(raw: &str) -> Result<Self, DecodeError> {
        serde_json::from_str(raw).map_err(|source| DecodeError::Json {
            message_type: "run update",
            source,
        })
    }

    /// True when applying this message cannot change any snapshot.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.changed_fields.is_empty()
            && self.checklist_deletes.is_empty()
            && self.timeline_event_deletes.is_empty()
            && self.status_post_deletes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Checklist update
// ---------------------------------------------------------------------------

/// Scalar fields of a checklist that may be patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ChecklistFieldPatch {
    pub title: Option<String>,
}

/// A single checklist's field changes plus item membership changes, applied
/// atomically under one timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ChecklistUpdate {
    pub id: ChecklistId,
    /// Advisory position hint; identifier is authoritative for routing.
    pub index: usize,
    /// Server timestamp of the change, epoch millis. Mandatory.
    pub checklist_updated_at: i64,
    pub fields: Option<ChecklistFieldPatch>,
    /// Field updates for existing items, each gated on its own timestamp.
    pub item_updates: Vec<ItemUpdate>,
    pub item_inserts: Vec<ChecklistItem>,
    pub item_deletes: Vec<ItemId>,
    /// Full item ordering after the change; items missing from the list
    /// keep their relative order at the tail.
    pub items_order: Option<Vec<ItemId>>,
}

/// The envelope the channel wraps a [`ChecklistUpdate`] in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ChecklistUpdateMessage {
    pub playbook_run_id: RunId,
    pub update: ChecklistUpdate,
}

impl ChecklistUpdateMessage {
    /// Decode a raw channel payload.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Json`] when the payload is not valid JSON for
    /// this message shape.
    pub fn from_json(raw: &str) -> Result<Self, DecodeError> {
        serde_json::from_str(raw).map_err(|source| DecodeError::Json {
            message_type: "checklist update",
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// Checklist-item update
// ---------------------------------------------------------------------------

/// Scalar fields of a checklist item that may be patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ItemFieldPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub state: Option<ItemState>,
    pub state_modified: Option<i64>,
    pub assignee_id: Option<UserId>,
    pub assignee_modified: Option<i64>,
    pub command: Option<String>,
    pub command_last_run: Option<i64>,
    pub due_date: Option<i64>,
}

/// A single item's field changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ItemUpdate {
    pub id: ItemId,
    /// Advisory position hint; identifier is authoritative for routing.
    pub index: usize,
    /// Server timestamp of the change, epoch millis. Mandatory.
    pub checklist_item_updated_at: i64,
    pub fields: ItemFieldPatch,
}

/// The envelope the channel wraps an [`ItemUpdate`] in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ItemUpdateMessage {
    pub playbook_run_id: RunId,
    pub checklist_id: ChecklistId,
    pub update: ItemUpdate,
}

impl ItemUpdateMessage {
    /// Decode a raw channel payload.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Json`] when the payload is not valid JSON for
    /// this message shape.
    pub fn from_json(raw: &str) -> Result<Self, DecodeError> {
        serde_json::from_str(raw).map_err(|source| DecodeError::Json {
            message_type: "checklist item update",
            source,
        })
    }
}
