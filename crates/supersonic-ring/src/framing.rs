//! Write and drain algorithms for a [`ByteRing`] (§4.1, §4.2).
//!
//! Frame layout: `magic(4) + payload_len(4) + sequence(4) + source_id(4)`
//! followed by the payload, padded to a 4-byte boundary. A wrap near the end
//! of the buffer is marked by a bare [`PADDING_MAGIC`] word (no length
//! field): the reader that sees it always jumps straight to offset 0.
//! Capacity is asserted 4-byte aligned at construction, so there are always
//! at least `FRAME_ALIGN` bytes between the tail and the end of the buffer
//! in which to drop that marker.

use std::sync::atomic::Ordering;

use supersonic_region::byte_ring::{ByteRing, InRing};
use supersonic_region::constants::{align4, FRAME_ALIGN, HEADER_SIZE, MESSAGE_MAGIC, PADDING_MAGIC};

use crossbeam_utils::Backoff;

use crate::error::RingError;

/// A decoded record, borrowed from the ring's backing storage for the
/// duration of the visitor callback in [`drain_records`].
pub struct RecordView<'a> {
    pub sequence: u32,
    pub source_id: u32,
    pub payload: &'a [u8],
}

fn used_bytes(head: u32, tail: u32, capacity: u32) -> u32 {
    if tail >= head {
        tail - head
    } else {
        capacity - head + tail
    }
}

/// Writes one record into `ring`, assuming the caller holds whatever
/// exclusivity the ring requires (the `IN` lock, or sole-producer status for
/// `OUT`/`DEBUG`). Not itself synchronized against other writers.
pub fn write_record(ring: &ByteRing, payload: &[u8], source_id: u32) -> Result<u32, RingError> {
    let capacity = ring.capacity();
    let payload_len = u32::try_from(payload.len()).map_err(|_| RingError::RecordTooLarge(u32::MAX))?;
    let frame_len = HEADER_SIZE + align4(payload_len);
    if frame_len + FRAME_ALIGN > capacity {
        return Err(RingError::RecordTooLarge(payload_len));
    }

    let tail = ring.load_tail(Ordering::Relaxed);
    let head = ring.load_head(Ordering::Acquire);
    let used = used_bytes(head, tail, capacity);
    let distance_to_end = capacity - tail;

    let padding_needed = if frame_len > distance_to_end { distance_to_end } else { 0 };
    let total_free = capacity - used - FRAME_ALIGN;
    if frame_len + padding_needed > total_free {
        return Err(RingError::Full);
    }

    let write_at = if padding_needed > 0 {
        debug_assert!(
            distance_to_end >= FRAME_ALIGN,
            "INV-RING-01: aligned capacity guarantees room for a padding marker"
        );
        // Safety: `[tail, tail+4)` is within the free region just checked.
        unsafe {
            ring.slice_mut(tail, FRAME_ALIGN)
                .copy_from_slice(&PADDING_MAGIC.to_be_bytes());
        }
        0
    } else {
        tail
    };

    let sequence = ring.next_sequence();
    let mut header = [0u8; HEADER_SIZE as usize];
    header[0..4].copy_from_slice(&MESSAGE_MAGIC.to_be_bytes());
    header[4..8].copy_from_slice(&payload_len.to_be_bytes());
    header[8..12].copy_from_slice(&sequence.to_be_bytes());
    header[12..16].copy_from_slice(&source_id.to_be_bytes());

    // Safety: `[write_at, write_at+frame_len)` is within the free region
    // checked above (padding, if any, was already consumed by the jump to 0).
    unsafe {
        let dest = ring.slice_mut(write_at, frame_len);
        dest[..HEADER_SIZE as usize].copy_from_slice(&header);
        dest[HEADER_SIZE as usize..HEADER_SIZE as usize + payload.len()].copy_from_slice(payload);
        for b in &mut dest[HEADER_SIZE as usize + payload.len()..] {
            *b = 0;
        }
    }

    let new_tail = (write_at + frame_len) % capacity;
    ring.store_tail(new_tail, Ordering::Release);
    Ok(sequence)
}

/// Non-blocking attempt to write into the `IN` ring: acquires the write
/// lock once and gives up immediately if it's held (§4.1).
pub fn write_in(in_ring: &InRing, payload: &[u8], source_id: u32) -> Result<u32, RingError> {
    if !in_ring.try_lock() {
        return Err(RingError::LockBusy);
    }
    let result = write_record(&in_ring.ring, payload, source_id);
    in_ring.unlock();
    result
}

/// Blocking write into the `IN` ring: retries the lock CAS with adaptive
/// backoff until acquired, used by worker-thread producers that can afford
/// to wait rather than drop (§4.1 "blocking mode").
pub fn write_in_blocking(in_ring: &InRing, payload: &[u8], source_id: u32) -> Result<u32, RingError> {
    let backoff = Backoff::new();
    loop {
        if in_ring.try_lock() {
            let result = write_record(&in_ring.ring, payload, source_id);
            in_ring.unlock();
            return result;
        }
        if backoff.is_completed() {
            return Err(RingError::LockBusy);
        }
        backoff.snooze();
    }
}

/// Drains up to `max_records` records from `ring`, calling `visit` for each.
/// Returns the number of records actually visited (padding markers are
/// skipped silently and don't count).
///
/// # Errors
/// Returns [`RingError::Corrupt`] if a header doesn't start with either
/// magic value. Callers should follow a corrupt read with [`resync`].
pub fn drain_records(
    ring: &ByteRing,
    max_records: usize,
    mut visit: impl FnMut(RecordView<'_>),
) -> Result<usize, RingError> {
    let capacity = ring.capacity();
    let mut count = 0;
    loop {
        if count >= max_records {
            break;
        }
        let head = ring.load_head(Ordering::Relaxed);
        let tail = ring.load_tail(Ordering::Acquire);
        if head == tail {
            break;
        }

        // Safety: `[head, head+4)` was published via the tail Release store
        // observed above through the Acquire load.
        let magic = u32::from_be_bytes(unsafe { ring.slice(head, FRAME_ALIGN) }.try_into().unwrap());

        if magic == PADDING_MAGIC {
            ring.store_head(0, Ordering::Release);
            continue;
        }
        if magic != MESSAGE_MAGIC {
            return Err(RingError::Corrupt(head));
        }

        // Safety: header bytes were published by the same Release store.
        let header = unsafe { ring.slice(head, HEADER_SIZE) };
        let payload_len = u32::from_be_bytes(header[4..8].try_into().unwrap());
        let sequence = u32::from_be_bytes(header[8..12].try_into().unwrap());
        let source_id = u32::from_be_bytes(header[12..16].try_into().unwrap());
        let frame_len = HEADER_SIZE + align4(payload_len);
        if frame_len > capacity || head + frame_len > capacity {
            return Err(RingError::Corrupt(head));
        }

        // Safety: payload bytes fall within the same published frame.
        let payload = unsafe { ring.slice(head + HEADER_SIZE, payload_len) };
        visit(RecordView { sequence, source_id, payload });

        let new_head = (head + frame_len) % capacity;
        ring.store_head(new_head, Ordering::Release);
        count += 1;
    }
    Ok(count)
}

/// Recovery for [`RingError::Corrupt`]: drop whatever is unread by snapping
/// `head` to the current `tail`. Documented trade-off (§9 Open Questions):
/// this favors availability over replaying the corrupted tail of the ring.
pub fn resync(ring: &ByteRing) {
    let tail = ring.load_tail(Ordering::Acquire);
    ring.store_head(tail, Ordering::Release);
}

/// Non-destructive drain for a secondary reader that tails a ring it does
/// not own the `head` of (the `IN` log-sniffer, §4.9). `external_head` is
/// the caller's own cursor, advanced here but never written back to the
/// ring itself — the real consumer (the engine) owns `head`.
///
/// Open question resolution (§9 `IN_LOG_TAIL`): if the real consumer has
/// advanced so far past `external_head` that the unread bytes could have
/// been overwritten by subsequent writes, the cursor is snapped forward to
/// the real `head`, silently dropping the lapped window, the same
/// trade-off [`resync`] makes for a corrupt primary reader.
pub fn drain_from(
    ring: &ByteRing,
    external_head: &mut u32,
    max_records: usize,
    mut visit: impl FnMut(RecordView<'_>),
) -> Result<usize, RingError> {
    let capacity = ring.capacity();
    let real_head = ring.load_head(Ordering::Acquire);
    let lag = used_bytes(*external_head, real_head, capacity);
    if lag > capacity - FRAME_ALIGN {
        *external_head = real_head;
    }

    let mut count = 0;
    loop {
        if count >= max_records {
            break;
        }
        let head = *external_head;
        let tail = ring.load_tail(Ordering::Acquire);
        if head == tail {
            break;
        }

        // Safety: `[head, head+4)` lies in the published region between the
        // real head and `tail`, which this cursor never outruns.
        let magic = u32::from_be_bytes(unsafe { ring.slice(head, FRAME_ALIGN) }.try_into().unwrap());

        if magic == PADDING_MAGIC {
            *external_head = 0;
            continue;
        }
        if magic != MESSAGE_MAGIC {
            *external_head = tail;
            return Err(RingError::Corrupt(head));
        }

        let header = unsafe { ring.slice(head, HEADER_SIZE) };
        let payload_len = u32::from_be_bytes(header[4..8].try_into().unwrap());
        let sequence = u32::from_be_bytes(header[8..12].try_into().unwrap());
        let source_id = u32::from_be_bytes(header[12..16].try_into().unwrap());
        let frame_len = HEADER_SIZE + align4(payload_len);
        if frame_len > capacity || head + frame_len > capacity {
            *external_head = tail;
            return Err(RingError::Corrupt(head));
        }

        let payload = unsafe { ring.slice(head + HEADER_SIZE, payload_len) };
        visit(RecordView { sequence, source_id, payload });

        *external_head = (head + frame_len) % capacity;
        count += 1;
    }
    Ok(count)
}

/// [`drain_from`] against `IN`'s own persisted `log_tail` cursor, for the
/// single in-process log-sniffer worker (§4.9). Not safe to call from more
/// than one thread concurrently — `log_tail` has exactly one reader.
pub fn drain_in_log(
    in_ring: &InRing,
    max_records: usize,
    visit: impl FnMut(RecordView<'_>),
) -> Result<usize, RingError> {
    let mut log_tail = in_ring.load_log_tail();
    let result = drain_from(&in_ring.ring, &mut log_tail, max_records, visit);
    in_ring.store_log_tail(log_tail);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_drain_round_trips_one_record() {
        let ring = ByteRing::new(256);
        write_record(&ring, b"hello", 7).unwrap();
        let mut seen = Vec::new();
        let n = drain_records(&ring, 10, |r| {
            seen.push((r.sequence, r.source_id, r.payload.to_vec()));
        })
        .unwrap();
        assert_eq!(n, 1);
        assert_eq!(seen[0], (1, 7, b"hello".to_vec()));
        assert!(ring.is_empty());
    }

    #[test]
    fn drain_respects_max_records() {
        let ring = ByteRing::new(256);
        for i in 0..5u32 {
            write_record(&ring, &i.to_be_bytes(), 1).unwrap();
        }
        let mut seen = 0;
        drain_records(&ring, 3, |_| seen += 1).unwrap();
        assert_eq!(seen, 3);
        drain_records(&ring, 10, |_| seen += 1).unwrap();
        assert_eq!(seen, 5);
    }

    #[test]
    fn record_too_large_is_rejected() {
        let ring = ByteRing::new(64);
        let payload = vec![0u8; 100];
        let err = write_record(&ring, &payload, 1).unwrap_err();
        assert_eq!(err, RingError::RecordTooLarge(100));
    }

    #[test]
    fn full_ring_reports_full() {
        let ring = ByteRing::new(64);
        // 64 - 16 (header) - 4 (slack) = 44 usable payload bytes per record budget.
        let payload = vec![0u8; 40];
        write_record(&ring, &payload, 1).unwrap();
        let err = write_record(&ring, &payload, 1).unwrap_err();
        assert_eq!(err, RingError::Full);
    }

    #[test]
    fn wrap_inserts_padding_and_continues_at_zero() {
        let ring = ByteRing::new(64);
        // First record leaves little room at the end, forcing the second to pad+wrap.
        write_record(&ring, &vec![0u8; 20], 1).unwrap();
        let mut drained = Vec::new();
        drain_records(&ring, 10, |r| drained.push(r.payload.to_vec())).unwrap();
        assert_eq!(drained.len(), 1);

        // Re-fill near the end to force a wrap on the next write.
        ring.store_tail(48, Ordering::Relaxed);
        ring.store_head(48, Ordering::Relaxed);
        write_record(&ring, &vec![7u8; 8], 2).unwrap();
        let mut seen = Vec::new();
        drain_records(&ring, 10, |r| seen.push(r.payload.to_vec())).unwrap();
        assert_eq!(seen, vec![vec![7u8; 8]]);
    }

    #[test]
    fn drain_from_tails_independently_of_the_real_head() {
        let ring = ByteRing::new(256);
        write_record(&ring, b"one", 1).unwrap();
        write_record(&ring, b"two", 1).unwrap();

        // The real consumer drains everything...
        drain_records(&ring, 10, |_| {}).unwrap();
        assert!(ring.is_empty());

        // ...but the log-sniffer's own cursor starts at 0 and still sees both.
        let mut external_head = 0u32;
        let mut seen = Vec::new();
        let n = drain_from(&ring, &mut external_head, 10, |r| seen.push(r.payload.to_vec())).unwrap();
        assert_eq!(n, 2);
        assert_eq!(seen, vec![b"one".to_vec(), b"two".to_vec()]);
    }

    #[test]
    fn drain_from_resyncs_when_lapped() {
        let ring = ByteRing::new(64);
        // A stale cursor that, measured forward to the real head, would
        // have to cross nearly the whole ring — more than the ring could
        // ever hold unread, so the bytes it still thinks are ahead of it
        // have certainly been overwritten by now.
        let mut external_head = 2u32;
        let n = drain_from(&ring, &mut external_head, 10, |_| {}).unwrap();
        assert_eq!(n, 0);
        assert_eq!(external_head, 0, "cursor resyncs to the real head rather than reading stale bytes");
    }

    #[test]
    fn drain_in_log_persists_its_cursor_across_calls() {
        let in_ring = InRing::new(256);
        write_in(&in_ring, b"one", 1).unwrap();
        write_in(&in_ring, b"two", 1).unwrap();

        let mut seen = Vec::new();
        let n = drain_in_log(&in_ring, 1, |r| seen.push(r.payload.to_vec())).unwrap();
        assert_eq!(n, 1);
        assert_eq!(seen, vec![b"one".to_vec()]);

        let n = drain_in_log(&in_ring, 10, |r| seen.push(r.payload.to_vec())).unwrap();
        assert_eq!(n, 1);
        assert_eq!(seen, vec![b"one".to_vec(), b"two".to_vec()]);

        // The real consumer draining IN doesn't disturb the sniffer's cursor.
        drain_records(&in_ring.ring, 10, |_| {}).unwrap();
        assert_eq!(drain_in_log(&in_ring, 10, |_| {}).unwrap(), 0);
    }

    #[test]
    fn corrupt_header_reports_offset_and_resync_recovers() {
        let ring = ByteRing::new(64);
        write_record(&ring, b"ok", 1).unwrap();
        // Stomp the header to simulate corruption.
        unsafe {
            ring.slice_mut(0, 4).copy_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        }
        let err = drain_records(&ring, 10, |_| {}).unwrap_err();
        assert!(matches!(err, RingError::Corrupt(0)));
        resync(&ring);
        assert!(ring.is_empty());
    }
}
