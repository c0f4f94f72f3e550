//! End-to-end scenarios against a live [`HostAdaptor`]. These mirror the
//! six concrete scenarios the transport is built to satisfy: bypass
//! latency, prescheduler firing, cancel-by-tag, ring wrap, write-lock
//! contention fallback, and node-id uniqueness under concurrent load.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use supersonic_host::{HostAdaptor, HostConfig, SendOptions};
use supersonic_osc::{Encoder, OscMessage, OscPacket, OscValue};
use supersonic_ring::{drain_records, write_in_blocking};

fn status_packet() -> OscPacket {
    OscPacket::Message(OscMessage { addr: "/status".to_string(), args: vec![] })
}

fn group_packet(id: i32) -> OscPacket {
    OscPacket::Message(OscMessage {
        addr: "/g_new".to_string(),
        args: vec![OscValue::Int32(id), OscValue::Int32(0), OscValue::Int32(0)],
    })
}

/// S1 — a non-bundle message bypasses the prescheduler and lands in `IN`
/// well under the 20 ms budget, bumping `bypass_non_bundle`.
#[tokio::test]
async fn s1_bypass_path_latency() {
    let adaptor = HostAdaptor::init(HostConfig::default()).await.unwrap();

    let mut encoder = Encoder::new();
    let bytes = encoder.encode(&status_packet()).to_vec();

    let start = Instant::now();
    adaptor.send(&bytes, SendOptions::default()).unwrap();

    let mut seen = false;
    while start.elapsed() < Duration::from_millis(20) {
        let n = drain_records(&adaptor.region().in_ring.ring, 8, |_record| {}).unwrap();
        if n > 0 {
            seen = true;
            break;
        }
    }
    assert!(seen, "record did not reach IN within the bypass budget");

    let metrics = adaptor.metrics();
    assert_eq!(metrics.bypass_non_bundle, 1);

    adaptor.destroy().await.unwrap();
}

/// S2 — a far-future bundle is released by the prescheduler close to its
/// requested audio-clock time rather than immediately.
#[tokio::test]
async fn s2_prescheduler_firing() {
    let adaptor = HostAdaptor::init(HostConfig::default()).await.unwrap();

    let bundle = OscPacket::Bundle(supersonic_osc::OscBundle {
        time: supersonic_osc::TimeTag::default(),
        packets: vec![group_packet(1000)],
    });
    let mut encoder = Encoder::new();
    let bytes = encoder.encode(&bundle).to_vec();

    let release_at = 0.5;
    let sent_at = Instant::now();
    adaptor
        .send(&bytes, SendOptions { audio_time_s: Some(release_at), ..SendOptions::default() })
        .unwrap();

    loop {
        let n = drain_records(&adaptor.region().in_ring.ring, 8, |_record| {}).unwrap();
        if n > 0 {
            break;
        }
        if sent_at.elapsed() > Duration::from_secs(2) {
            panic!("prescheduler never released the far-future bundle");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let elapsed = sent_at.elapsed().as_secs_f64();
    assert!((elapsed - release_at).abs() < 0.05, "released at {elapsed}s, wanted ~{release_at}s");

    adaptor.destroy().await.unwrap();
}

/// S3 — cancelling one run_tag drops only that tag's queued bundles and
/// reports them through the `cancelled` metric; the other tag still fires.
#[tokio::test]
async fn s3_cancel_by_tag() {
    let adaptor = HostAdaptor::init(HostConfig::default()).await.unwrap();
    let mut encoder = Encoder::new();

    for i in 0..3 {
        let bundle = OscPacket::Bundle(supersonic_osc::OscBundle {
            time: supersonic_osc::TimeTag::default(),
            packets: vec![group_packet(2000 + i)],
        });
        let bytes = encoder.encode(&bundle).to_vec();
        adaptor
            .send(
                &bytes,
                SendOptions { session_id: 1, run_tag: 10, audio_time_s: Some(1.0), current_time_s: None },
            )
            .unwrap();
    }
    for i in 0..2 {
        let bundle = OscPacket::Bundle(supersonic_osc::OscBundle {
            time: supersonic_osc::TimeTag::default(),
            packets: vec![group_packet(3000 + i)],
        });
        let bytes = encoder.encode(&bundle).to_vec();
        adaptor
            .send(
                &bytes,
                SendOptions { session_id: 1, run_tag: 11, audio_time_s: Some(1.0), current_time_s: None },
            )
            .unwrap();
    }

    adaptor.cancel_tag(10);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let mut released = 0;
    drain_records(&adaptor.region().in_ring.ring, 64, |_record| released += 1).unwrap();

    assert_eq!(released, 2, "only run_tag 11's two bundles should survive");
    assert_eq!(adaptor.metrics().cancelled, 3);

    adaptor.destroy().await.unwrap();
}

/// S4 — repeatedly sending records past a small `IN` capacity wraps the
/// ring multiple times; every record is still readable, in order, with no
/// corruption reported.
#[tokio::test]
async fn s4_ring_wrap() {
    let config = HostConfig { in_ring_capacity: 4096, ..HostConfig::default() };
    let adaptor = HostAdaptor::init(config).await.unwrap();
    let mut encoder = Encoder::new();

    let total = 600;
    for i in 0..total {
        let bytes = encoder.encode(&group_packet(i)).to_vec();
        adaptor.send(&bytes, SendOptions::default()).unwrap();

        let n = drain_records(&adaptor.region().in_ring.ring, 64, |record| {
            let packet = supersonic_osc::decode(record.payload).unwrap();
            assert!(matches!(packet, OscPacket::Message(_)));
        })
        .unwrap();
        let _ = n;
    }

    let metrics = adaptor.metrics();
    assert_eq!(metrics.decode_failures, 0);

    adaptor.destroy().await.unwrap();
}

/// S5 — a `send_immediate` that finds the `IN` write lock already held
/// never spins on it: the first non-blocking attempt bails out with
/// `LockBusy`, and the send reroutes through the direct-dispatch fallback
/// (counted in `direct_write_fallbacks`), which still delivers the record.
#[tokio::test]
async fn s5_contention_fallback() {
    let adaptor = Arc::new(HostAdaptor::init(HostConfig::default()).await.unwrap());

    let region = Arc::clone(adaptor.region());
    assert!(region.in_ring.try_lock(), "test setup should be able to acquire the write lock");
    let holder_region = Arc::clone(&region);
    let holder = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(15));
        holder_region.in_ring.unlock();
    });

    assert_eq!(adaptor.metrics().direct_write_fallbacks, 0);

    let mut encoder = Encoder::new();
    let bytes = encoder.encode(&status_packet()).to_vec();
    adaptor.send_immediate(&bytes).unwrap();
    assert_eq!(
        adaptor.metrics().direct_write_fallbacks, 1,
        "a contended bypass write should reroute through the direct-dispatch fallback"
    );

    holder.join().unwrap();

    let mut records = Vec::new();
    drain_records(&adaptor.region().in_ring.ring, 8, |record| records.push(record.source_id)).unwrap();
    assert!(records.iter().any(|&id| id == 0), "fallback write never reached the ring");

    adaptor.destroy().await.unwrap();
}

/// S6 — concurrent `next_node_id` calls across several channels never
/// collide: the union of ids handed out is exactly as large as the number
/// of calls, all at or above the first allocatable id.
#[tokio::test]
async fn s6_node_id_uniqueness_under_load() {
    let adaptor = Arc::new(HostAdaptor::init(HostConfig::default()).await.unwrap());

    const CHANNELS: usize = 4;
    const PER_CHANNEL: usize = 2_500;

    let mut handles = Vec::new();
    for _ in 0..CHANNELS {
        let channel = adaptor.new_worker_channel();
        handles.push(tokio::task::spawn_blocking(move || {
            (0..PER_CHANNEL).map(|_| channel.next_node_id()).collect::<Vec<_>>()
        }));
    }

    let mut all_ids = HashSet::new();
    for handle in handles {
        for id in handle.await.unwrap() {
            assert!(id >= 1000);
            all_ids.insert(id);
        }
    }

    assert_eq!(all_ids.len(), CHANNELS * PER_CHANNEL);

    adaptor.destroy().await.unwrap();
}
