//! Checklist and checklist-item entities.
//!
//! Both carry an `update_at` timestamp with the same contract: it only ever
//! increases across merges, and an incoming update whose timestamp is not
//! strictly newer is a no-op. A value `<= 0` means "never seen an
//! incremental update" and loses to any positive server timestamp.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::ids::{ChecklistId, ItemId, UserId};

/// Lifecycle state of a checklist item.
///
/// Wire strings follow the server: open is the empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ItemState {
    #[default]
    #[serde(rename = "")]
    Open,
    #[serde(rename = "in_progress")]
    InProgress,
    #[serde(rename = "closed")]
    Closed,
    #[serde(rename = "skipped")]
    Skipped,
}

impl ItemState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "",
            Self::InProgress => "in_progress",
            Self::Closed => "closed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single task within a checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ChecklistItem {
    pub id: ItemId,
    pub title: String,
    pub description: String,
    pub state: ItemState,
    /// When `state` last changed, epoch millis.
    pub state_modified: i64,
    pub assignee_id: Option<UserId>,
    /// When `assignee_id` last changed, epoch millis.
    pub assignee_modified: i64,
    /// Slash command attached to the task, empty when none.
    pub command: String,
    pub command_last_run: i64,
    /// Due date, epoch millis; `0` when unset.
    pub due_date: i64,
    /// Monotone merge gate, epoch millis. `<= 0` means unseen.
    pub update_at: i64,
}

/// An ordered list of tasks owned by exactly one run.
///
/// Items are shared behind `Arc` so that merging one item leaves its
/// siblings pointer-identical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Checklist {
    pub id: ChecklistId,
    pub title: String,
    pub items: Vec<Arc<ChecklistItem>>,
    /// Monotone merge gate, epoch millis. `<= 0` means unseen.
    pub update_at: i64,
}

impl Checklist {
    /// Position of an item within this checklist, by identifier.
    #[must_use]
    pub fn item_index(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == *id)
    }

    /// Whether an item with the given identifier exists.
    #[must_use]
    pub fn contains_item(&self, id: &ItemId) -> bool {
        self.item_index(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_state_open_is_empty_string_on_wire() {
        let json = serde_json::to_string(&ItemState::Open).expect("serialize");
        assert_eq!(json, "\"\"");
        let back: ItemState = serde_json::from_str("\"\"").expect("deserialize");
        assert_eq!(back, ItemState::Open);
    }

    #[test]
    fn item_state_decodes_every_wire_string() {
        let cases = [
            ("\"\"", ItemState::Open),
            ("\"in_progress\"", ItemState::InProgress),
            ("\"closed\"", ItemState::Closed),
            ("\"skipped\"", ItemState::Skipped),
        ];
        for (raw, want) in cases {
            let got: ItemState = serde_json::from_str(raw).expect("deserialize");
            assert_eq!(got, want);
        }
        assert!(serde_json::from_str::<ItemState>("\"bogus\"").is_err());
    }

    #[test]
    fn item_index_finds_by_id() {
        let checklist = Checklist {
            id: ChecklistId::new("c1"),
            title: "Triage".to_string(),
            items: vec![
                Arc::new(ChecklistItem {
                    id: ItemId::new("i1"),
                    ..ChecklistItem::default()
                }),
                Arc::new(ChecklistItem {
                    id: ItemId::new("i2"),
                    ..ChecklistItem::default()
                }),
            ],
            update_at: 0,
        };
        assert_eq!(checklist.item_index(&ItemId::new("i2")), Some(1));
        assert_eq!(checklist.item_index(&ItemId::new("i9")), None);
    }
}
