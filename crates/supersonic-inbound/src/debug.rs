//! `DEBUG` ring reader: decodes scsynth debug/trace traffic and dispatches
//! `Event::Debug`. Same shape as the reply reader but against a separate
//! ring so a chatty debug session never crowds out real replies.

use supersonic_region::SharedRegion;
use supersonic_ring::RingError;

use crate::reader::drain_and_dispatch;
use crate::registry::{Event, ListenerRegistry};

pub fn poll_debug(region: &SharedRegion, max_records: usize, registry: &ListenerRegistry) -> Result<usize, RingError> {
    drain_and_dispatch(
        &region.debug_ring,
        max_records,
        registry,
        &|| {
            region.metrics.inc_decode_failures();
        },
        Event::Debug,
    )
}
