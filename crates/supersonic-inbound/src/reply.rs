//! `OUT` ring reader: decodes scsynth replies and dispatches `Event::Message`.

use supersonic_region::SharedRegion;
use supersonic_ring::RingError;

use crate::reader::drain_and_dispatch;
use crate::registry::{Event, ListenerRegistry};

/// One pass over the `OUT` ring. Intended to be called from the reply
/// worker's tick loop; returns the number of replies dispatched.
pub fn poll_replies(region: &SharedRegion, max_records: usize, registry: &ListenerRegistry) -> Result<usize, RingError> {
    drain_and_dispatch(
        &region.out_ring,
        max_records,
        registry,
        &|| {
            region.metrics.inc_decode_failures();
        },
        Event::Message,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use supersonic_osc::{Encoder, OscMessage, OscPacket};
    use supersonic_region::RegionConfig;
    use supersonic_ring::write_record;

    #[test]
    fn poll_replies_dispatches_and_drains_the_out_ring() {
        let region = SharedRegion::new(&RegionConfig::default());
        let mut encoder = Encoder::new();
        let packet = OscPacket::Message(OscMessage {
            addr: "/n_go".to_string(),
            args: vec![],
        });
        let bytes = encoder.encode(&packet).to_vec();
        write_record(&region.out_ring, &bytes, 0).unwrap();

        let registry = ListenerRegistry::new();
        let n = poll_replies(&region, 8, &registry).unwrap();
        assert_eq!(n, 1);
        assert_eq!(poll_replies(&region, 8, &registry).unwrap(), 0);
    }
}
