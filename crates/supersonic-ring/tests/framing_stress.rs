use std::sync::Arc;
use std::thread;

use supersonic_region::byte_ring::InRing;
use supersonic_ring::{drain_records, write_in_blocking};

#[test]
fn concurrent_producers_never_lose_or_duplicate_sequences() {
    const N_PRODUCERS: usize = 4;
    const RECORDS_PER_PRODUCER: u32 = 2_000;

    let in_ring = Arc::new(InRing::new(1 << 16));
    let mut handles = Vec::new();

    for producer_id in 0..N_PRODUCERS {
        let ring = Arc::clone(&in_ring);
        handles.push(thread::spawn(move || {
            for i in 0..RECORDS_PER_PRODUCER {
                let payload = i.to_be_bytes();
                write_in_blocking(&ring, &payload, producer_id as u32).unwrap();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let mut sequences = Vec::new();
    loop {
        let mut batch = 0;
        drain_records(&in_ring.ring, 256, |r| {
            sequences.push(r.sequence);
            batch += 1;
        })
        .unwrap();
        if batch == 0 {
            break;
        }
    }

    assert_eq!(sequences.len(), N_PRODUCERS * RECORDS_PER_PRODUCER as usize);
    let mut sorted = sequences.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(
        sorted.len(),
        sequences.len(),
        "every sequence number handed out must be distinct"
    );
}

#[test]
fn fifo_order_is_preserved_for_a_single_producer() {
    let in_ring = InRing::new(1 << 14);
    const N: u32 = 5_000;
    for i in 0..N {
        write_in_blocking(&in_ring, &i.to_be_bytes(), 1).unwrap();
    }

    let mut expected = 0u32;
    let consumed = drain_records(&in_ring.ring, N as usize, |r| {
        let got = u32::from_be_bytes(r.payload.try_into().unwrap());
        assert_eq!(got, expected, "FIFO violation: expected {expected}, got {got}");
        expected += 1;
    })
    .unwrap();

    assert_eq!(consumed, N as usize);
}
