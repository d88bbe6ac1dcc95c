//! Bounded in-memory dedup set for webhook event ids.
//!
//! Payment providers deliver webhooks at least once, so the gateway keeps
//! a window of recently seen event ids and skips reprocessing within it.
//! The set is bounded: when full, the oldest id is evicted first-in
//! first-out. This is a best-effort shortcut; the state machine's own
//! idempotent transitions are what make redelivery safe after eviction
//! or restart.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

/// Default number of event ids to remember.
pub const DEFAULT_DEDUP_CAPACITY: usize = 1000;

struct GuardState {
    seen: HashSet<String>,
    order: VecDeque<String>,
}

/// Bounded FIFO set of processed webhook event ids.
pub struct IdempotencyGuard {
    state: Mutex<GuardState>,
    capacity: usize,
}

impl IdempotencyGuard {
    /// Creates a guard remembering up to `capacity` event ids.
    ///
    /// A zero capacity is treated as 1 so the guard always remembers at
    /// least the last event.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(GuardState {
                seen: HashSet::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    /// Returns true if this event id is within the remembered window.
    pub fn contains(&self, event_id: &str) -> bool {
        self.state.lock().unwrap().seen.contains(event_id)
    }

    /// Records an event id, evicting the oldest id when full.
    ///
    /// Returns false if the id was already present (nothing changes).
    pub fn register(&self, event_id: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.seen.contains(event_id) {
            return false;
        }

        if state.order.len() >= self.capacity {
            if let Some(oldest) = state.order.pop_front() {
                state.seen.remove(&oldest);
            }
        }
        state.order.push_back(event_id.to_string());
        state.seen.insert(event_id.to_string());
        true
    }

    /// Number of event ids currently remembered.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for IdempotencyGuard {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_DEDUP_CAPACITY)
    }
}
