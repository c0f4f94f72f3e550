//! Draining logic shared by the reply and debug readers (§4.8): pull
//! framed records out of a [`ByteRing`], decode each as an OSC packet, and
//! dispatch it through the [`ListenerRegistry`].

use supersonic_region::ByteRing;
use supersonic_ring::{drain_records, RingError};
use tracing::{debug, warn};

use crate::registry::{Event, ListenerRegistry};

/// Drains up to `max_records` from `ring`, decoding each as OSC and handing
/// it to `registry` wrapped in `wrap`. Decode failures are logged and
/// counted but never stop the drain — one malformed reply must not starve
/// the rest of the ring.
pub fn drain_and_dispatch(
    ring: &ByteRing,
    max_records: usize,
    registry: &ListenerRegistry,
    decode_failures: &dyn Fn(),
    wrap: impl Fn(supersonic_osc::OscPacket) -> Event,
) -> Result<usize, RingError> {
    drain_records(ring, max_records, |record| match supersonic_osc::decode(record.payload) {
        Ok(packet) => {
            debug!(sequence = record.sequence, source_id = record.source_id, "dispatching inbound packet");
            registry.dispatch(&wrap(packet));
        }
        Err(err) => {
            warn!(sequence = record.sequence, error = %err, "dropping malformed inbound record");
            decode_failures();
            registry.dispatch(&Event::Error(err.to_string()));
        }
    })
}
