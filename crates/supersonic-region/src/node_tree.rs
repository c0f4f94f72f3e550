//! Node-tree mirror (§3.1, §4.8 "tree mirror reader").
//!
//! The engine publishes a snapshot of its node tree into a fixed-capacity
//! array of [`NodeEntry`] records, guarded by a version counter using the
//! same odd/even seqlock convention as `TimingState`: odd means "a writer is
//! mid-publish," even means "stable." Readers retry until they observe an
//! even version both before and after copying.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::constants::{EMPTY_NODE_ID, NODE_ENTRY_SIZE};

/// One row of the mirrored node tree. Field order matches the wire layout
/// the engine publishes: six `i32` links followed by a 32-byte def name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeEntry {
    pub id: i32,
    pub parent_id: i32,
    pub prev_id: i32,
    pub next_id: i32,
    pub head_id: i32,
    pub is_group: i32,
    pub def_name: [u8; 32],
}

impl NodeEntry {
    pub const EMPTY: NodeEntry = NodeEntry {
        id: EMPTY_NODE_ID,
        parent_id: EMPTY_NODE_ID,
        prev_id: EMPTY_NODE_ID,
        next_id: EMPTY_NODE_ID,
        head_id: EMPTY_NODE_ID,
        is_group: 0,
        def_name: [0u8; 32],
    };

    #[must_use]
    pub fn is_empty_slot(&self) -> bool {
        self.id == EMPTY_NODE_ID
    }

    /// Def name up to the first NUL, as a lossy UTF-8 string. The scratch
    /// copy is taken by the caller before this scan so a concurrent
    /// republish can't tear a multi-byte sequence mid-read.
    #[must_use]
    pub fn def_name_str(&self) -> std::borrow::Cow<'_, str> {
        let end = self
            .def_name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.def_name.len());
        String::from_utf8_lossy(&self.def_name[..end])
    }
}

/// Version-stable mirror of the engine's node tree.
pub struct NodeTreeMirror {
    version: AtomicU32,
    dropped_count: AtomicU32,
    node_count: AtomicU32,
    capacity: usize,
    entries: Box<[std::cell::UnsafeCell<NodeEntry>]>,
}

// Safety: entries are only mutated by the single publisher thread, behind
// the version seqlock protocol; readers only ever take scratch copies.
unsafe impl Send for NodeTreeMirror {}
unsafe impl Sync for NodeTreeMirror {}

impl NodeTreeMirror {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let entries = (0..capacity)
            .map(|_| std::cell::UnsafeCell::new(NodeEntry::EMPTY))
            .collect();
        Self {
            version: AtomicU32::new(0),
            dropped_count: AtomicU32::new(0),
            node_count: AtomicU32::new(0),
            capacity,
            entries,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn node_count(&self) -> u32 {
        self.node_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn dropped_count(&self) -> u32 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    /// Monotonically increasing publish counter (§8 "tree monotonicity").
    /// Even while stable, odd mid-publish; callers that only want to detect
    /// change can compare two reads without caring which.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.version.load(Ordering::Acquire)
    }

    /// Byte size of the mirror region this capacity requires.
    #[must_use]
    pub fn byte_size(capacity: usize) -> usize {
        capacity * NODE_ENTRY_SIZE
    }

    /// Publishes a full snapshot. Only the single owning writer thread (the
    /// host adaptor's tree-mirror publisher) calls this.
    pub fn publish(&self, rows: &[NodeEntry]) {
        debug_assert!(rows.len() <= self.capacity, "INV-TREE-01: snapshot fits capacity");
        self.version.fetch_add(1, Ordering::Release); // now odd: writer in progress
        let count = rows.len().min(self.capacity);
        for (i, row) in rows.iter().take(count).enumerate() {
            // Safety: sole writer, protected by the version fence below.
            unsafe {
                *self.entries[i].get() = *row;
            }
        }
        for slot in &self.entries[count..self.capacity] {
            unsafe {
                *slot.get() = NodeEntry::EMPTY;
            }
        }
        self.node_count.store(count as u32, Ordering::Relaxed);
        self.version.fetch_add(1, Ordering::Release); // now even: stable
    }

    pub fn record_dropped(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads a stable snapshot, retrying if a publish happens mid-read.
    ///
    /// Bounded retry: if the writer keeps interleaving (practically only
    /// under test-grade hammering), returns the last copy taken anyway
    /// rather than spinning forever, same trade the reader makes on
    /// `TimingState::read`.
    #[must_use]
    pub fn read_snapshot(&self) -> Vec<NodeEntry> {
        const MAX_ATTEMPTS: u32 = 32;
        let mut out = vec![NodeEntry::EMPTY; self.capacity];
        for _ in 0..MAX_ATTEMPTS {
            let before = self.version.load(Ordering::Acquire);
            if before % 2 == 1 {
                std::hint::spin_loop();
                continue;
            }
            for (i, slot) in self.entries.iter().enumerate() {
                // Safety: scratch-copy read; validated against `version` below.
                out[i] = unsafe { *slot.get() };
            }
            let after = self.version.load(Ordering::Acquire);
            if before == after {
                let count = self.node_count.load(Ordering::Relaxed) as usize;
                out.truncate(count.min(self.capacity));
                return out;
            }
        }
        let count = self.node_count.load(Ordering::Relaxed) as usize;
        out.truncate(count.min(self.capacity));
        out
    }
}
