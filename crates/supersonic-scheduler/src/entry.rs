//! A single prescheduler entry and its ordering (§4.6).
//!
//! Entries are released in `release_ntp` order; ties break on arrival order
//! so two bundles scheduled for the same instant still dispatch in the
//! order they were enqueued.

use std::cmp::Ordering;

use supersonic_osc::OscPacket;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CancelKey {
    pub session_id: u32,
    pub run_tag: u32,
}

pub struct ScheduledEntry {
    pub release_ntp: f64,
    pub arrival_seq: u64,
    pub key: CancelKey,
    pub packet: OscPacket,
    /// Cancellation-index generation this entry was enqueued under; a
    /// later `cancel_all` invalidates anything with a smaller generation.
    pub generation: u64,
}

impl PartialEq for ScheduledEntry {
    fn eq(&self, other: &Self) -> bool {
        self.release_ntp == other.release_ntp && self.arrival_seq == other.arrival_seq
    }
}
impl Eq for ScheduledEntry {}

impl PartialOrd for ScheduledEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// `BinaryHeap` is a max-heap; we want the *earliest* release first, so this
/// ordering is reversed relative to the natural `f64`/`u64` order.
impl Ord for ScheduledEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .release_ntp
            .partial_cmp(&self.release_ntp)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.arrival_seq.cmp(&self.arrival_seq))
    }
}
