//! Convergence oracle: after the channel drains, every replica must hold
//! exactly the reference snapshot, and the snapshot itself must satisfy
//! the engine's structural invariants.

use std::collections::HashSet;
use std::sync::Arc;

use runsync_core::model::RunSnapshot;

/// Result of checking all invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleResult {
    pub passed: bool,
    pub violations: Vec<InvariantViolation>,
}

impl OracleResult {
    fn from_violations(violations: Vec<InvariantViolation>) -> Self {
        Self {
            passed: violations.is_empty(),
            violations,
        }
    }
}

/// Diagnostic for a single failed invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A replica's final snapshot differs from the in-order reference.
    ReferenceMismatch { replica: usize },
    /// A checklist holds two items with the same id.
    DuplicateItemId { replica: usize, checklist: String },
    /// Timeline events are not sorted ascending by creation time.
    TimelineOutOfOrder { replica: usize },
    /// Two timeline events share an id.
    DuplicateEventId { replica: usize, event: String },
}

/// Check every replica against the reference and the structural invariants.
#[must_use]
pub fn check_all(reference: &Arc<RunSnapshot>, replicas: &[Arc<RunSnapshot>]) -> OracleResult {
    let mut violations = Vec::new();

    for (replica, snapshot) in replicas.iter().enumerate() {
        if **snapshot != **reference {
            violations.push(InvariantViolation::ReferenceMismatch { replica });
        }
        check_structure(replica, snapshot, &mut violations);
    }

    OracleResult::from_violations(violations)
}

fn check_structure(
    replica: usize,
    snapshot: &Arc<RunSnapshot>,
    violations: &mut Vec<InvariantViolation>,
) {
    for checklist in &snapshot.checklists {
        let mut seen = HashSet::new();
        for item in &checklist.items {
            if !seen.insert(item.id.clone()) {
                violations.push(InvariantViolation::DuplicateItemId {
                    replica,
                    checklist: checklist.id.to_string(),
                });
            }
        }
    }

    let mut seen_events = HashSet::new();
    for pair in snapshot.timeline_events.windows(2) {
        if pair[0].create_at > pair[1].create_at {
            violations.push(InvariantViolation::TimelineOutOfOrder { replica });
        }
    }
    for event in &snapshot.timeline_events {
        if !seen_events.insert(event.id.clone()) {
            violations.push(InvariantViolation::DuplicateEventId {
                replica,
                event: event.id.to_string(),
            });
        }
    }
}
