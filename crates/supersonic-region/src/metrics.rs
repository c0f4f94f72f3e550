//! Fixed-schema metrics block (§3.1).

use std::sync::atomic::{AtomicU32, Ordering};

macro_rules! counters {
    ($( $name:ident ),+ $(,)?) => {
        /// Atomic counters, incremented with `fetch_add` from any thread.
        #[derive(Default)]
        pub struct MetricsBlock {
            $( pub(crate) $name: AtomicU32, )+
        }

        impl MetricsBlock {
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            $(
                #[inline]
                pub fn $name(&self) -> u32 {
                    self.$name.load(Ordering::Relaxed)
                }
            )+

            /// Plain-load snapshot of every counter (§5 "snapshots use plain load").
            #[must_use]
            pub fn snapshot(&self) -> MetricsSnapshot {
                MetricsSnapshot {
                    $( $name: self.$name(), )+
                }
            }
        }

        /// Point-in-time copy of [`MetricsBlock`], safe to hand to callers.
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct MetricsSnapshot {
            $( pub $name: u32, )+
        }
    };
}

counters!(
    messages_sent,
    messages_received,
    bytes_sent,
    bytes_received,
    bypass_non_bundle,
    bypass_immediate,
    bypass_near_future,
    bypass_late,
    far_future_scheduled,
    ring_write_retries,
    cancelled,
    direct_write_fallbacks,
    corrupt_resyncs,
    decode_failures,
    process_tick,
    engine_headroom,
);

impl MetricsBlock {
    #[inline]
    pub fn add_messages_sent(&self, n: u32) {
        self.messages_sent.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_bytes_sent(&self, n: u32) {
        self.bytes_sent.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_messages_received(&self, n: u32) {
        self.messages_received.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_bytes_received(&self, n: u32) {
        self.bytes_received.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc(&self, counter: &AtomicU32) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_bypass_non_bundle(&self) {
        self.bypass_non_bundle.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_bypass_immediate(&self) {
        self.bypass_immediate.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_bypass_near_future(&self) {
        self.bypass_near_future.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_bypass_late(&self) {
        self.bypass_late.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_far_future_scheduled(&self) {
        self.far_future_scheduled.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_ring_write_retries(&self, n: u32) {
        self.ring_write_retries.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_cancelled(&self, n: u32) {
        self.cancelled.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_direct_write_fallbacks(&self) {
        self.direct_write_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_corrupt_resyncs(&self) {
        self.corrupt_resyncs.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_decode_failures(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn set_process_tick(&self, value: u32) {
        self.process_tick.store(value, Ordering::Relaxed);
    }

    #[inline]
    pub fn set_engine_headroom(&self, value: u32) {
        self.engine_headroom.store(value, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero_and_accumulate() {
        let m = MetricsBlock::new();
        assert_eq!(m.messages_sent(), 0);
        m.add_messages_sent(3);
        m.add_messages_sent(2);
        assert_eq!(m.messages_sent(), 5);

        m.inc_bypass_non_bundle();
        m.inc_direct_write_fallbacks();
        let snap = m.snapshot();
        assert_eq!(snap.messages_sent, 5);
        assert_eq!(snap.bypass_non_bundle, 1);
        assert_eq!(snap.direct_write_fallbacks, 1);
    }
}
