//! Shared-memory region layout for the SuperSonic OSC transport.
//!
//! This crate owns the data side of the region: byte-ring storage, the
//! metrics block, the timing anchor, node-id allocation, and the node-tree
//! mirror. The framing algorithms that read and write these structures live
//! in `supersonic-ring` and above.

pub mod audio_capture;
pub mod byte_ring;
pub mod constants;
pub mod metrics;
pub mod node_id;
pub mod node_tree;
pub mod region;
pub mod timing_state;

pub use audio_capture::AudioCaptureRing;
pub use byte_ring::{ByteRing, InRing};
pub use metrics::{MetricsBlock, MetricsSnapshot};
pub use node_id::NodeIdCounter;
pub use node_tree::{NodeEntry, NodeTreeMirror};
pub use region::{RegionConfig, RegionLayout, SharedRegion};
pub use timing_state::TimingState;
