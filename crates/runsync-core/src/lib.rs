//! Incremental state synchronization for live playbook-run snapshots.
//!
//! A client holds a local, potentially stale snapshot of a run (name,
//! owner, checklists, items, timeline) and receives a stream of partial,
//! possibly out-of-order, possibly duplicated update messages over a push
//! channel. This crate merges those messages into new, consistent
//! snapshots without ever regressing to older data and without duplicating
//! list entries.
//!
//! The public surface is the snapshot model ([`model`]), the wire message
//! shapes ([`update`]), and three pure merge functions ([`merge`]):
//!
//! - [`merge::merge_run`] — bulk payload of changed top-level fields,
//!   including the nested timeline and checklist collections.
//! - [`merge::merge_checklist`] — one checklist's field changes plus item
//!   insertions/deletions, atomic under one server timestamp.
//! - [`merge::merge_item`] — one item's field changes.
//!
//! No I/O, no configuration, no persisted state. The transport that
//! delivers messages and the query layer that fetches full snapshots are
//! the caller's concern.
//!
//! # Conventions
//!
//! - **Errors**: merge functions are total and never fail; only wire
//!   decoding returns `Result` ([`update::DecodeError`]).
//! - **Logging**: `tracing` macros; stale/misrouted updates log at `debug`,
//!   malformed ones at `warn`.

pub mod merge;
pub mod model;
pub mod update;

pub use merge::{merge_checklist, merge_item, merge_run};
pub use model::RunSnapshot;
