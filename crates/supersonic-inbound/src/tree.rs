//! Tree-mirror reader (§4.8). The mirror itself lives in `supersonic-region`
//! and is always safe to read directly; this module only adds
//! change-detection so the listener registry isn't spammed with a
//! `TreeUpdate` event on every tick when nothing actually moved.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use supersonic_region::NodeTreeMirror;

use crate::registry::{Event, ListenerRegistry};

/// Tracks the last observed `version` so `poll_tree` can skip dispatch when
/// the tree hasn't changed since the previous poll.
pub struct TreeReader {
    last_version: AtomicU32,
}

impl Default for TreeReader {
    fn default() -> Self {
        Self {
            last_version: AtomicU32::new(u32::MAX),
        }
    }
}

impl TreeReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the mirror and dispatches `Event::TreeUpdate` if `version`
    /// changed since the last poll. Returns `true` if dispatched.
    pub fn poll_tree(&self, mirror: &NodeTreeMirror, registry: &ListenerRegistry) -> bool {
        let version = mirror.version();
        if self.last_version.swap(version, Ordering::Relaxed) == version {
            return false;
        }
        let snapshot = mirror.read_snapshot();
        registry.dispatch(&Event::TreeUpdate(Arc::new(snapshot)));
        true
    }
}
