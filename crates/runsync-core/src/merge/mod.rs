//! The merge engine: three pure, composable merge operations.
//!
//! Each operation takes a held snapshot and one decoded update message and
//! returns a new snapshot, or the identical input `Arc` when the update is
//! a no-op. The input is never mutated, so a caller using pointer equality
//! can reliably distinguish "nothing changed" from "something changed" and
//! swap the new reference in atomically.
//!
//! # Safety under the channel's delivery guarantees
//!
//! The push channel delivers at-least-once and may reorder. Safety rests on
//! one rule: every checklist and item carries a monotone `update_at`
//! timestamp, and a merge whose incoming timestamp is not strictly newer is
//! rejected as a no-op. With that gate, redelivery changes nothing and
//! messages for the same entity are order-independent (the newest
//! timestamp wins regardless of arrival order). Messages for different
//! entities never interact, so no cross-entity ordering is required.
//!
//! All three operations are total: unknown run/checklist/item ids are
//! benign races (a deletion that has not propagated locally yet) and
//! resolve to returning the input unchanged, never an error. A degraded
//! outcome is only ever "slightly stale data until the next full-snapshot
//! fetch".

pub mod checklist;
pub mod item;
pub mod run;
mod timeline;

pub use checklist::merge_checklist;
pub use item::merge_item;
pub use run::merge_run;
