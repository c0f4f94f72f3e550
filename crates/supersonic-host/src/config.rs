//! Host configuration (§6.3 `init(config)`).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use supersonic_region::constants::{DEFAULT_MAX_BUFFERS, DEFAULT_PRESCHEDULER_CAPACITY};

/// Transport backing strategy. The channel interface is identical either
/// way (§9 "message-passing variant") — only how records cross into the
/// engine differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Shared,
    Message,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub mode: TransportMode,
    pub prescheduler_capacity: usize,
    pub bypass_lookahead_s: f64,
    pub audio_base_url: Option<String>,
    pub synthdef_base_url: Option<String>,
    pub audio_path_map: HashMap<String, String>,
    pub max_buffers: usize,
    pub in_ring_capacity: u32,
    pub out_ring_capacity: u32,
    pub debug_ring_capacity: u32,
    pub node_tree_capacity: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            mode: TransportMode::Shared,
            prescheduler_capacity: DEFAULT_PRESCHEDULER_CAPACITY,
            bypass_lookahead_s: 0.2,
            audio_base_url: None,
            synthdef_base_url: None,
            audio_path_map: HashMap::new(),
            max_buffers: DEFAULT_MAX_BUFFERS,
            in_ring_capacity: 1 << 20,
            out_ring_capacity: 1 << 20,
            debug_ring_capacity: 1 << 16,
            node_tree_capacity: 4096,
        }
    }
}
