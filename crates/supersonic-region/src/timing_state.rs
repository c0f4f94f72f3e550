//! Shared timing anchor (§3.1, §4.4).
//!
//! `ntp_start` is a 64-bit float and cannot be updated atomically as a
//! whole, so it is published through the same odd/even version convention
//! used by [`crate::node_tree::NodeTreeMirror`]: a "seqlock" in miniature,
//! sized for a single `f64` rather than an arbitrary record.

use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};

/// Drift and global offset are reported in milliseconds (§4.4 "periodic
/// drift correction"), fitting comfortably in an `i32`.
pub struct TimingState {
    version: AtomicU32,
    ntp_start: std::cell::UnsafeCell<f64>,
    drift_ms: AtomicI32,
    global_offset_ms: AtomicI32,
    anchored: AtomicU32,
}

unsafe impl Send for TimingState {}
unsafe impl Sync for TimingState {}

impl Default for TimingState {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: AtomicU32::new(0),
            ntp_start: std::cell::UnsafeCell::new(0.0),
            drift_ms: AtomicI32::new(0),
            global_offset_ms: AtomicI32::new(0),
            anchored: AtomicU32::new(0),
        }
    }

    #[must_use]
    pub fn is_anchored(&self) -> bool {
        self.anchored.load(Ordering::Acquire) != 0
    }

    /// Publishes a new `ntp_start` anchor. Single-writer: only the timing
    /// worker that owns the anchor computation calls this.
    pub fn publish_anchor(&self, ntp_start: f64) {
        self.version.fetch_add(1, Ordering::Release);
        // Safety: sole writer, bracketed by the version fence.
        unsafe {
            *self.ntp_start.get() = ntp_start;
        }
        self.version.fetch_add(1, Ordering::Release);
        self.anchored.store(1, Ordering::Release);
    }

    /// Reads the anchor, retrying across a concurrent publish.
    #[must_use]
    pub fn read_anchor(&self) -> Option<f64> {
        if !self.is_anchored() {
            return None;
        }
        const MAX_ATTEMPTS: u32 = 32;
        for _ in 0..MAX_ATTEMPTS {
            let before = self.version.load(Ordering::Acquire);
            if before % 2 == 1 {
                std::hint::spin_loop();
                continue;
            }
            // Safety: scratch read, validated against `version` below.
            let value = unsafe { *self.ntp_start.get() };
            let after = self.version.load(Ordering::Acquire);
            if before == after {
                return Some(value);
            }
        }
        None
    }

    pub fn set_drift_ms(&self, drift: i32) {
        self.drift_ms.store(drift, Ordering::Relaxed);
    }

    #[must_use]
    pub fn drift_ms(&self) -> i32 {
        self.drift_ms.load(Ordering::Relaxed)
    }

    pub fn set_global_offset_ms(&self, offset: i32) {
        self.global_offset_ms.store(offset, Ordering::Relaxed);
    }

    #[must_use]
    pub fn global_offset_ms(&self) -> i32 {
        self.global_offset_ms.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unanchored_reads_return_none() {
        let state = TimingState::new();
        assert!(!state.is_anchored());
        assert_eq!(state.read_anchor(), None);
    }

    #[test]
    fn publish_then_read_round_trips() {
        let state = TimingState::new();
        state.publish_anchor(123.456);
        assert!(state.is_anchored());
        assert_eq!(state.read_anchor(), Some(123.456));
    }

    #[test]
    fn drift_and_offset_are_independent_of_anchor() {
        let state = TimingState::new();
        state.set_drift_ms(7);
        state.set_global_offset_ms(-3);
        assert_eq!(state.drift_ms(), 7);
        assert_eq!(state.global_offset_ms(), -3);
    }
}
