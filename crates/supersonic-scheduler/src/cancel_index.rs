//! Cancellation index (§4.6): lets a caller cancel scheduled-but-not-yet-
//! released entries by exact `(session_id, run_tag)`, by `session_id` alone,
//! by `run_tag` alone, or all at once, without walking the heap.
//!
//! A `cancel_all` is recorded as a generation bump rather than draining the
//! heap: every entry remembers the generation it was enqueued under, and
//! the release loop treats anything enqueued before the current generation
//! as cancelled. This keeps `cancel_all` O(1) at the cost of one extra
//! comparison per release.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::entry::CancelKey;

pub struct CancellationIndex {
    exact: Mutex<HashSet<CancelKey>>,
    sessions: Mutex<HashSet<u32>>,
    tags: Mutex<HashSet<u32>>,
    generation: AtomicU64,
}

impl Default for CancellationIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationIndex {
    #[must_use]
    pub fn new() -> Self {
        Self {
            exact: Mutex::new(HashSet::new()),
            sessions: Mutex::new(HashSet::new()),
            tags: Mutex::new(HashSet::new()),
            generation: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn cancel_session_tag(&self, session_id: u32, run_tag: u32) {
        self.exact.lock().unwrap().insert(CancelKey { session_id, run_tag });
    }

    pub fn cancel_session(&self, session_id: u32) {
        self.sessions.lock().unwrap().insert(session_id);
    }

    pub fn cancel_tag(&self, run_tag: u32) {
        self.tags.lock().unwrap().insert(run_tag);
    }

    /// Cancels everything enqueued so far. Entries enqueued afterward are
    /// unaffected.
    pub fn cancel_all(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    #[must_use]
    pub fn is_cancelled(&self, key: CancelKey, enqueued_generation: u64) -> bool {
        if enqueued_generation < self.current_generation() {
            return true;
        }
        if self.exact.lock().unwrap().contains(&key) {
            return true;
        }
        if self.sessions.lock().unwrap().contains(&key.session_id) {
            return true;
        }
        self.tags.lock().unwrap().contains(&key.run_tag)
    }

    /// Drops bookkeeping for a key once it has actually been released or
    /// discarded, so the index doesn't grow unbounded across a long-running
    /// session's lifetime.
    pub fn forget(&self, key: CancelKey) {
        self.exact.lock().unwrap().remove(&key);
    }
}
