//! The action queue: ready combatants in strict FIFO readiness order.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::CombatantId;

/// Ordered queue of combatants whose gauge filled with an action
/// assigned. Consumed strictly from the front, one at a time.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ActionQueue {
    entries: VecDeque<CombatantId>,
}

impl ActionQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a newly ready combatant. Gauge reset on assignment keeps
    /// a combatant from becoming ready twice; a duplicate here means
    /// that invariant broke upstream.
    pub fn enqueue(&mut self, id: CombatantId) {
        debug_assert!(
            !self.entries.contains(&id),
            "combatant {id} queued twice before acting"
        );
        debug!(combatant = %id, "enqueued for action");
        self.entries.push_back(id);
    }

    /// The combatant whose action is (or will be) in flight.
    #[must_use]
    pub fn front(&self) -> Option<CombatantId> {
        self.entries.front().copied()
    }

    /// Remove the front entry once its pipeline run finished.
    pub fn dequeue(&mut self) -> Option<CombatantId> {
        self.entries.pop_front()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn contains(&self, id: CombatantId) -> bool {
        self.entries.contains(&id)
    }

    /// Drop every entry (end of battle).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop a specific combatant (fled or removed mid-wait).
    pub fn remove(&mut self, id: CombatantId) {
        self.entries.retain(|e| *e != id);
    }
}
