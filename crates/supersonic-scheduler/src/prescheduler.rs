//! The prescheduler itself (§4.6): a priority queue of far-future bundles,
//! released as their deadline arrives.

use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use supersonic_osc::OscPacket;
use tracing::trace;

use crate::cancel_index::CancellationIndex;
use crate::entry::{CancelKey, ScheduledEntry};
use crate::error::SchedulerError;
use crate::shutdown::ShutdownSignal;

pub struct Prescheduler {
    heap: Mutex<BinaryHeap<ScheduledEntry>>,
    cancel_index: Arc<CancellationIndex>,
    arrival_counter: AtomicU64,
    capacity: usize,
    shutdown: ShutdownSignal,
}

impl Prescheduler {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::new()),
            cancel_index: Arc::new(CancellationIndex::new()),
            arrival_counter: AtomicU64::new(0),
            capacity,
            shutdown: ShutdownSignal::new(),
        }
    }

    #[must_use]
    pub fn cancel_index(&self) -> Arc<CancellationIndex> {
        Arc::clone(&self.cancel_index)
    }

    #[must_use]
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.lock().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Schedules `packet` for release at `release_ntp`, or dispatches it
    /// immediately via `dispatch` if that time has already passed by the
    /// time it reaches the scheduler. This covers two distinct races: a
    /// far-future classification whose deadline a clock resync then pulls
    /// into the past, and a caller that deliberately passes `release_ntp`
    /// already due (e.g. the non-blocking write-lock fallback, which passes
    /// `release_ntp = 0.0` to force the immediate path).
    pub fn schedule(
        &self,
        now_ntp: f64,
        release_ntp: f64,
        key: CancelKey,
        packet: OscPacket,
        dispatch: impl FnOnce(OscPacket),
    ) -> Result<(), SchedulerError> {
        if release_ntp <= now_ntp {
            dispatch(packet);
            return Ok(());
        }
        self.enqueue(release_ntp, key, packet)
    }

    pub fn enqueue(&self, release_ntp: f64, key: CancelKey, packet: OscPacket) -> Result<(), SchedulerError> {
        if self.shutdown.is_shutdown() {
            return Err(SchedulerError::ShutDown);
        }
        let mut heap = self.heap.lock().unwrap();
        if heap.len() >= self.capacity {
            return Err(SchedulerError::Full);
        }
        let arrival_seq = self.arrival_counter.fetch_add(1, Ordering::Relaxed);
        let generation = self.cancel_index.current_generation();
        heap.push(ScheduledEntry {
            release_ntp,
            arrival_seq,
            key,
            packet,
            generation,
        });
        Ok(())
    }

    /// Releases every entry whose `release_ntp` has arrived, up to `max`,
    /// calling `visit` for each surviving (non-cancelled) one. Returns
    /// `(released, cancelled)` for metrics.
    pub fn release_due(&self, now_ntp: f64, max: usize, mut visit: impl FnMut(OscPacket)) -> (usize, usize) {
        let mut released = 0;
        let mut cancelled = 0;
        let mut heap = self.heap.lock().unwrap();
        while released + cancelled < max {
            let Some(top) = heap.peek() else { break };
            if top.release_ntp > now_ntp {
                break;
            }
            let entry = heap.pop().unwrap();
            if self.cancel_index.is_cancelled(entry.key, entry.generation) {
                self.cancel_index.forget(entry.key);
                cancelled += 1;
                trace!(session_id = entry.key.session_id, run_tag = entry.key.run_tag, "prescheduler entry cancelled");
                continue;
            }
            visit(entry.packet);
            released += 1;
        }
        (released, cancelled)
    }
}
