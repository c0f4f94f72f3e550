//! The per-producer channel façade (§4.7): classify, write, schedule,
//! allocate node ids, and report metrics, all from one producer's point of
//! view.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use supersonic_osc::{Encoder, OscPacket};
use supersonic_region::SharedRegion;
use supersonic_ring::{write_in, write_in_blocking, RingError};
use supersonic_scheduler::{CancelKey, Prescheduler};
use supersonic_timing::{classify, Category, TimingModel};
use tracing::{trace, warn};

use crate::error::ChannelError;
use crate::node_alloc::NodeAllocator;

#[derive(Debug, Clone, Copy)]
pub struct ChannelConfig {
    pub source_id: u32,
    pub lookahead_s: f64,
}

/// One producer's view of the transport: every outbound packet from a
/// single JS context flows through one `Channel`.
pub struct Channel {
    region: Arc<SharedRegion>,
    scheduler: Arc<Prescheduler>,
    timing: Arc<TimingModel>,
    node_alloc: NodeAllocator,
    encoder: Encoder,
    config: ChannelConfig,
    closed: AtomicBool,
}

impl Channel {
    #[must_use]
    pub fn new_shared_memory(
        region: Arc<SharedRegion>,
        scheduler: Arc<Prescheduler>,
        timing: Arc<TimingModel>,
        config: ChannelConfig,
    ) -> Self {
        let node_alloc = NodeAllocator::shared_memory(Arc::clone(&region));
        Self {
            region,
            scheduler,
            timing,
            node_alloc,
            encoder: Encoder::new(),
            config,
            closed: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn new_message_passing(
        region: Arc<SharedRegion>,
        scheduler: Arc<Prescheduler>,
        timing: Arc<TimingModel>,
        config: ChannelConfig,
    ) -> Self {
        let node_alloc = NodeAllocator::message_passing(Arc::clone(&region));
        Self {
            region,
            scheduler,
            timing,
            node_alloc,
            encoder: Encoder::new(),
            config,
            closed: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn next_node_id(&self) -> u32 {
        self.node_alloc.next_node_id()
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn require_open(&self) -> Result<(), ChannelError> {
        if self.is_closed() {
            return Err(ChannelError::Closed);
        }
        Ok(())
    }

    /// Writes a packet straight to the `IN` ring, skipping classification.
    /// Used for replies and debug traffic that should never wait on the
    /// prescheduler (§4.7 `send_direct`).
    pub fn send_direct(&mut self, packet: &OscPacket) -> Result<(), ChannelError> {
        self.require_open()?;
        self.write_bypass(packet, CancelKey { session_id: 0, run_tag: 0 })
    }

    /// Attempts a single non-blocking write-lock acquisition first; if the
    /// lock is contended, reroutes through the prescheduler as an
    /// already-due entry (`release_ntp = 0.0`) so it is dispatched from
    /// there with a blocking write instead of spinning on this thread.
    fn write_bypass(&mut self, packet: &OscPacket, key: CancelKey) -> Result<(), ChannelError> {
        let bytes = self.encoder.encode(packet);
        let len = bytes.len() as u32;
        match write_in(&self.region.in_ring, bytes, self.config.source_id) {
            Ok(_) => {
                self.region.metrics.add_messages_sent(1);
                self.region.metrics.add_bytes_sent(len);
                Ok(())
            }
            Err(RingError::LockBusy) => {
                let region = Arc::clone(&self.region);
                let config = self.config;
                let packet = packet.clone();
                self.scheduler.schedule(0.0, 0.0, key, packet, |packet| {
                    region.metrics.inc_direct_write_fallbacks();
                    let mut encoder = Encoder::new();
                    let bytes = encoder.encode(&packet);
                    let len = bytes.len() as u32;
                    if write_in_blocking(&region.in_ring, bytes, config.source_id).is_ok() {
                        region.metrics.add_messages_sent(1);
                        region.metrics.add_bytes_sent(len);
                    }
                })?;
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Explicitly enqueues a packet into the prescheduler for release at
    /// `release_ntp`, bypassing classification (§4.7 `send_to_prescheduler`).
    pub fn send_to_prescheduler(
        &self,
        session_id: u32,
        run_tag: u32,
        release_ntp: f64,
        packet: OscPacket,
    ) -> Result<(), ChannelError> {
        self.require_open()?;
        self.scheduler
            .enqueue(release_ntp, CancelKey { session_id, run_tag }, packet)?;
        self.region.metrics.inc_far_future_scheduled();
        Ok(())
    }

    /// Classifies `packet` and routes it: non-bundle / immediate / near-
    /// future / late bundles bypass straight to the `IN` ring; far-future
    /// bundles go to the prescheduler (§4.5, §4.7 `send`).
    pub fn send(&mut self, session_id: u32, run_tag: u32, packet: OscPacket) -> Result<(), ChannelError> {
        self.require_open()?;

        let now_audio = self.timing.now_audio_seconds();
        let ntp_to_audio = {
            let region = Arc::clone(&self.region);
            let timing = Arc::clone(&self.timing);
            move |ntp: f64| timing.ntp_to_audio(&region.timing, ntp).unwrap_or(f64::INFINITY)
        };
        let category = classify(&packet, now_audio, self.config.lookahead_s, ntp_to_audio);
        let key = CancelKey { session_id, run_tag };

        match category {
            Category::NonBundle => {
                self.region.metrics.inc_bypass_non_bundle();
                self.write_bypass(&packet, key)
            }
            Category::Immediate => {
                self.region.metrics.inc_bypass_immediate();
                self.write_bypass(&packet, key)
            }
            Category::NearFuture => {
                self.region.metrics.inc_bypass_near_future();
                self.write_bypass(&packet, key)
            }
            Category::Late => {
                self.region.metrics.inc_bypass_late();
                warn!(session_id, run_tag, "dispatching a bundle whose deadline already passed");
                self.write_bypass(&packet, key)
            }
            Category::FarFuture => {
                let release_ntp = packet.timetag().to_ntp_seconds();
                let now_ntp = self
                    .timing
                    .audio_to_ntp(&self.region.timing, now_audio)
                    .unwrap_or(release_ntp - 1.0);
                let region = Arc::clone(&self.region);
                let config = self.config;
                let result = self.scheduler.schedule(now_ntp, release_ntp, key, packet, |packet| {
                    region.metrics.inc_direct_write_fallbacks();
                    let mut encoder = Encoder::new();
                    let bytes = encoder.encode(&packet);
                    let len = bytes.len() as u32;
                    if write_in_blocking(&region.in_ring, bytes, config.source_id).is_ok() {
                        region.metrics.add_messages_sent(1);
                        region.metrics.add_bytes_sent(len);
                    }
                });
                if result.is_ok() {
                    trace!(session_id, run_tag, release_ntp, "scheduled far-future bundle");
                    self.region.metrics.inc_far_future_scheduled();
                }
                Ok(result?)
            }
        }
    }

    pub fn cancel_session_tag(&self, session_id: u32, run_tag: u32) {
        self.scheduler.cancel_index().cancel_session_tag(session_id, run_tag);
    }

    pub fn cancel_session(&self, session_id: u32) {
        self.scheduler.cancel_index().cancel_session(session_id);
    }

    pub fn cancel_tag(&self, run_tag: u32) {
        self.scheduler.cancel_index().cancel_tag(run_tag);
    }

    pub fn cancel_all(&self) {
        self.scheduler.cancel_index().cancel_all();
    }

    #[must_use]
    pub fn metrics(&self) -> supersonic_region::MetricsSnapshot {
        self.region.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use supersonic_osc::{OscBundle, OscMessage, TimeTag};
    use supersonic_region::RegionConfig;
    use supersonic_timing::{AudioClock, WallClock};

    struct FixedWallClock(f64);
    impl WallClock for FixedWallClock {
        fn now_ntp_seconds(&self) -> f64 {
            self.0
        }
    }

    struct FixedAudioClock(AtomicU64);
    impl AudioClock for FixedAudioClock {
        fn now_seconds(&self) -> f64 {
            f64::from_bits(self.0.load(Ordering::Relaxed))
        }
    }

    fn make_channel() -> Channel {
        let region = Arc::new(SharedRegion::new(&RegionConfig::default()));
        let scheduler = Arc::new(Prescheduler::new(1024));
        let wall = Arc::new(FixedWallClock(1_000_000.0));
        let audio = Arc::new(FixedAudioClock(AtomicU64::new(0.0_f64.to_bits())));
        let timing = Arc::new(TimingModel::new(wall, audio));
        timing.establish(&region.timing);
        Channel::new_shared_memory(
            region,
            scheduler,
            timing,
            ChannelConfig {
                source_id: 1,
                lookahead_s: 0.2,
            },
        )
    }

    #[test]
    fn non_bundle_message_goes_straight_to_the_ring() {
        let mut channel = make_channel();
        let packet = OscPacket::Message(OscMessage {
            addr: "/n_set".to_string(),
            args: vec![],
        });
        channel.send(1, 1, packet).unwrap();
        assert_eq!(channel.metrics().bypass_non_bundle, 1);
        assert_eq!(channel.metrics().messages_sent, 1);
    }

    #[test]
    fn far_future_bundle_is_scheduled_not_written_immediately() {
        let mut channel = make_channel();
        let far_future_ntp = 1_000_000.0 + supersonic_osc::constants::NTP_EPOCH_OFFSET * 0.0 + 100.0;
        let packet = OscPacket::Bundle(OscBundle {
            time: TimeTag::from_ntp_seconds(far_future_ntp),
            packets: vec![OscPacket::Message(OscMessage {
                addr: "/s_new".to_string(),
                args: vec![],
            })],
        });
        channel.send(1, 1, packet).unwrap();
        assert_eq!(channel.metrics().far_future_scheduled, 1);
        assert_eq!(channel.metrics().messages_sent, 0);
    }

    #[test]
    fn send_on_closed_channel_is_rejected() {
        let mut channel = make_channel();
        channel.close();
        let packet = OscPacket::Message(OscMessage {
            addr: "/n_set".to_string(),
            args: vec![],
        });
        let err = channel.send(1, 1, packet).unwrap_err();
        assert_eq!(err, ChannelError::Closed);
    }
}
