//! The shared region itself (§3.1): the aggregate that every other crate
//! borrows from to reach rings, metrics, timing state, and node bookkeeping.

use crate::audio_capture::AudioCaptureRing;
use crate::byte_ring::{ByteRing, InRing};
use crate::constants::{DEFAULT_MAX_BUFFERS, DEFAULT_PRESCHEDULER_CAPACITY};
use crate::metrics::MetricsBlock;
use crate::node_id::NodeIdCounter;
use crate::node_tree::NodeTreeMirror;
use crate::timing_state::TimingState;

/// Sizing knobs for a [`SharedRegion`]. In production these are resolved
/// from constants the engine publishes; tests construct a `RegionConfig`
/// directly so small regions are cheap to allocate.
#[derive(Debug, Clone, Copy)]
pub struct RegionConfig {
    pub in_ring_capacity: u32,
    pub out_ring_capacity: u32,
    pub debug_ring_capacity: u32,
    pub node_tree_capacity: usize,
    pub prescheduler_capacity: usize,
    pub max_buffers: usize,
    pub audio_capture: Option<(u32, u32)>,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            in_ring_capacity: 1 << 20,
            out_ring_capacity: 1 << 20,
            debug_ring_capacity: 1 << 16,
            node_tree_capacity: 4096,
            prescheduler_capacity: DEFAULT_PRESCHEDULER_CAPACITY,
            max_buffers: DEFAULT_MAX_BUFFERS,
            audio_capture: None,
        }
    }
}

/// Resolved byte layout derived from a [`RegionConfig`], mirroring the
/// fixed-offset table the engine publishes at init (§3.1).
#[derive(Debug, Clone, Copy)]
pub struct RegionLayout {
    pub in_ring_capacity: u32,
    pub out_ring_capacity: u32,
    pub debug_ring_capacity: u32,
    pub node_tree_capacity: usize,
    pub node_tree_bytes: usize,
}

impl RegionLayout {
    #[must_use]
    pub fn from_config(config: &RegionConfig) -> Self {
        Self {
            in_ring_capacity: config.in_ring_capacity,
            out_ring_capacity: config.out_ring_capacity,
            debug_ring_capacity: config.debug_ring_capacity,
            node_tree_capacity: config.node_tree_capacity,
            node_tree_bytes: NodeTreeMirror::byte_size(config.node_tree_capacity),
        }
    }
}

/// The region: three byte rings, the metrics block, the timing anchor, the
/// node-id counter, the node-tree mirror, and an optional audio capture tap.
///
/// This crate models the region as a single in-process allocation. A real
/// embedding backs the same fields with a `SharedArrayBuffer`/WASM linear
/// memory region instead; the layout and protocol are identical either way.
pub struct SharedRegion {
    pub layout: RegionLayout,
    pub in_ring: InRing,
    pub out_ring: ByteRing,
    pub debug_ring: ByteRing,
    pub metrics: MetricsBlock,
    pub timing: TimingState,
    pub node_ids: NodeIdCounter,
    pub node_tree: NodeTreeMirror,
    pub audio_capture: Option<AudioCaptureRing>,
    pub prescheduler_capacity: usize,
    pub max_buffers: usize,
}

impl SharedRegion {
    #[must_use]
    pub fn new(config: &RegionConfig) -> Self {
        let layout = RegionLayout::from_config(config);
        let audio_capture = config
            .audio_capture
            .map(|(channels, frames)| AudioCaptureRing::new(channels, frames));
        Self {
            layout,
            in_ring: InRing::new(config.in_ring_capacity),
            out_ring: ByteRing::new(config.out_ring_capacity),
            debug_ring: ByteRing::new(config.debug_ring_capacity),
            metrics: MetricsBlock::new(),
            timing: TimingState::new(),
            node_ids: NodeIdCounter::new(),
            node_tree: NodeTreeMirror::new(config.node_tree_capacity),
            audio_capture,
            prescheduler_capacity: config.prescheduler_capacity,
            max_buffers: config.max_buffers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_produces_usable_region() {
        let region = SharedRegion::new(&RegionConfig::default());
        assert!(region.in_ring.ring.is_empty());
        assert!(region.out_ring.is_empty());
        assert_eq!(region.node_ids.peek(), crate::constants::FIRST_NODE_ID);
        assert!(region.audio_capture.is_none());
    }

    #[test]
    fn audio_capture_enabled_when_configured() {
        let config = RegionConfig {
            audio_capture: Some((2, 512)),
            ..RegionConfig::default()
        };
        let region = SharedRegion::new(&config);
        assert!(region.audio_capture.is_some());
    }
}
