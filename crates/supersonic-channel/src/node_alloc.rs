//! Per-producer node id allocation (§4.7).
//!
//! The shared-memory variant hands out ids straight from the region's
//! global [`NodeIdCounter`] — one atomic `fetch_add` per id, no local
//! state needed. The message-passing variant instead prefetches a range at
//! a time, so a producer issuing ids in a tight loop touches the shared
//! counter once per `PREFETCH_BATCH` ids rather than once per id. A new
//! worker channel reserves [`INITIAL_BATCH`] ids up front, and tops up with
//! another [`PREFETCH_BATCH`] as soon as fewer than that many remain —
//! ahead of exhaustion, not at it, so a producer never waits on the shared
//! counter mid-burst.

use std::cell::Cell;
use std::sync::Arc;

use supersonic_region::SharedRegion;

const PREFETCH_BATCH: u32 = 1000;
const INITIAL_BATCH: u32 = 10_000;

pub enum NodeAllocator {
    SharedMemory(Arc<SharedRegion>),
    MessagePassing {
        region: Arc<SharedRegion>,
        next: Cell<u32>,
        remaining: Cell<u32>,
        /// A batch reserved ahead of need, swapped in once `remaining`
        /// hits zero so the swap itself never touches the shared counter.
        prefetched: Cell<Option<(u32, u32)>>,
    },
}

impl NodeAllocator {
    #[must_use]
    pub fn shared_memory(region: Arc<SharedRegion>) -> Self {
        Self::SharedMemory(region)
    }

    #[must_use]
    pub fn message_passing(region: Arc<SharedRegion>) -> Self {
        let base = region.node_ids.reserve(INITIAL_BATCH);
        Self::MessagePassing {
            region,
            next: Cell::new(base),
            remaining: Cell::new(INITIAL_BATCH),
            prefetched: Cell::new(None),
        }
    }

    pub fn next_node_id(&self) -> u32 {
        match self {
            NodeAllocator::SharedMemory(region) => region.node_ids.next(),
            NodeAllocator::MessagePassing { region, next, remaining, prefetched } => {
                if remaining.get() < PREFETCH_BATCH && prefetched.get().is_none() {
                    prefetched.set(Some((region.node_ids.reserve(PREFETCH_BATCH), PREFETCH_BATCH)));
                }
                if remaining.get() == 0 {
                    let (base, count) =
                        prefetched.take().expect("prefetch must complete before the current batch is exhausted");
                    next.set(base);
                    remaining.set(count);
                }
                let id = next.get();
                next.set(id + 1);
                remaining.set(remaining.get() - 1);
                id
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use supersonic_region::constants::FIRST_NODE_ID;
    use supersonic_region::RegionConfig;

    #[test]
    fn shared_memory_allocator_hands_out_consecutive_ids() {
        let region = Arc::new(SharedRegion::new(&RegionConfig::default()));
        let alloc = NodeAllocator::shared_memory(Arc::clone(&region));
        assert_eq!(alloc.next_node_id(), FIRST_NODE_ID);
        assert_eq!(alloc.next_node_id(), FIRST_NODE_ID + 1);
    }

    #[test]
    fn message_passing_allocator_reserves_initial_batch_up_front() {
        let region = Arc::new(SharedRegion::new(&RegionConfig::default()));
        let alloc = NodeAllocator::message_passing(Arc::clone(&region));
        // Construction alone should have reserved the initial 10,000 ids,
        // before a single `next_node_id()` call.
        assert_eq!(region.node_ids.peek(), FIRST_NODE_ID + INITIAL_BATCH);
        assert_eq!(alloc.next_node_id(), FIRST_NODE_ID);
    }

    #[test]
    fn message_passing_allocator_tops_up_before_exhaustion() {
        let region = Arc::new(SharedRegion::new(&RegionConfig::default()));
        let alloc = NodeAllocator::message_passing(Arc::clone(&region));

        for _ in 0..INITIAL_BATCH {
            alloc.next_node_id();
        }
        // The initial batch is now fully consumed. Because the top-up
        // triggers while ids still remain (not at zero), the shared counter
        // has already moved past a second PREFETCH_BATCH range.
        assert_eq!(region.node_ids.peek(), FIRST_NODE_ID + INITIAL_BATCH + PREFETCH_BATCH);

        // The handoff to the prefetched batch is seamless: no gap, no wait.
        let next_id = alloc.next_node_id();
        assert_eq!(next_id, FIRST_NODE_ID + INITIAL_BATCH);
    }
}
