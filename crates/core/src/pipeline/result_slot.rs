use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::shared::region::ResultSet;

struct SlotState {
    latest: Arc<ResultSet>,
    /// Publications from generations below this are stale.
    floor: u64,
}

/// Single-slot mailbox holding the most recently completed [`ResultSet`].
///
/// The lock is held only for an `Arc` clone or swap, so a reader sees either
/// the previous set or the new one, never a partial update.
pub struct ResultSlot {
    state: Mutex<SlotState>,
}

impl ResultSlot {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                latest: Arc::new(ResultSet::default()),
                floor: 0,
            }),
        }
    }

    pub fn latest(&self) -> Arc<ResultSet> {
        Arc::clone(&self.lock().latest)
    }

    /// Replaces the current set unless `generation` has been abandoned.
    /// Returns whether the set was published.
    pub fn publish(&self, generation: u64, results: ResultSet) -> bool {
        let results = Arc::new(results);
        let mut state = self.lock();
        if generation < state.floor {
            return false;
        }
        state.latest = results;
        true
    }

    /// Rejects any later publication from `generation` or older.
    pub fn abandon_through(&self, generation: u64) {
        let mut state = self.lock();
        state.floor = state.floor.max(generation + 1);
    }

    // A panicking publisher cannot leave the state half-written, so a
    // poisoned lock is still safe to read.
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ResultSlot {
    fn default() -> Self {
        Self::new()
    }
}
