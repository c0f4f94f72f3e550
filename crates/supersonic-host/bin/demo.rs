//! End-to-end demo of the host adaptor, with an in-process stand-in for
//! `scsynth` itself.
//!
//! A real embedding has the engine draining `IN` and writing `OUT`/`debug`;
//! here a background thread does the same thing so the demo can show a full
//! round trip without a WASM build. Run with:
//!
//! ```bash
//! cargo run -p supersonic-host --bin supersonic-demo
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use supersonic_host::{Event, EventKind, HostAdaptor, HostConfig, SendOptions, SharedRegion};
use supersonic_osc::{decode, Encoder, OscMessage, OscPacket, OscValue};
use supersonic_ring::{drain_records, write_record};

const ENGINE_POLL: Duration = Duration::from_millis(2);

/// Stands in for `scsynth`: drains `IN`, replies to `/status` on `OUT`, and
/// mirrors every other message onto `debug` the way a running synth server
/// echoes its command stream.
fn spawn_fake_engine(region: Arc<SharedRegion>, stop: Arc<AtomicBool>) -> std::thread::JoinHandle<u64> {
    std::thread::spawn(move || {
        let mut handled = 0u64;
        while !stop.load(Ordering::Relaxed) {
            let mut replies = Vec::new();
            let mut echoes = Vec::new();
            let result = drain_records(&region.in_ring.ring, 256, |record| {
                if let Ok(packet) = decode(record.payload) {
                    if let OscPacket::Message(msg) = &packet {
                        if msg.addr == "/status" {
                            replies.push(status_reply());
                        } else {
                            echoes.push(packet.clone());
                        }
                    }
                    handled += 1;
                }
            });
            if let Err(err) = result {
                eprintln!("   (engine) IN ring corrupt: {err}, resyncing");
                supersonic_ring::resync(&region.in_ring.ring);
            }

            let mut encoder = Encoder::new();
            for reply in replies {
                let bytes = encoder.encode(&reply).to_vec();
                let _ = write_record(&region.out_ring, &bytes, 0);
            }
            for echo in echoes {
                let bytes = encoder.encode(&echo).to_vec();
                let _ = write_record(&region.debug_ring, &bytes, 0);
            }

            std::thread::sleep(ENGINE_POLL);
        }
        handled
    })
}

fn status_reply() -> OscPacket {
    OscPacket::Message(OscMessage {
        addr: "/status.reply".to_string(),
        args: vec![
            OscValue::Int32(1),
            OscValue::Int32(0),
            OscValue::Int32(0),
            OscValue::Float32(0.0),
            OscValue::Float32(0.0),
        ],
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("supersonic_host=info,supersonic_scheduler=info").init();

    print_banner();

    println!("Phase 1: bringing up the host adaptor\n");
    let config = HostConfig::default();
    let adaptor = Arc::new(HostAdaptor::init(config).await?);
    println!("   adaptor ready\n");

    println!("Phase 2: starting the fake engine\n");
    let stop = Arc::new(AtomicBool::new(false));
    let engine = spawn_fake_engine(Arc::clone(adaptor.region()), Arc::clone(&stop));

    let replies_seen = Arc::new(AtomicU64::new(0));
    let replies_clone = Arc::clone(&replies_seen);
    adaptor.on(EventKind::Message, move |event| {
        if let Event::Message(OscPacket::Message(msg)) = event {
            replies_clone.fetch_add(1, Ordering::Relaxed);
            println!("   <- reply: {}", msg.addr);
        }
    });
    adaptor.on(EventKind::Error, |event| {
        if let Event::Error(detail) = event {
            eprintln!("   !! inbound error: {detail}");
        }
    });

    println!("Phase 3: sending messages\n");
    let mut encoder = Encoder::new();

    let status = OscPacket::Message(OscMessage { addr: "/status".to_string(), args: vec![] });
    let bytes = encoder.encode(&status).to_vec();
    adaptor.send_immediate(&bytes)?;
    println!("   -> /status (immediate bypass)");

    for i in 0..3u32 {
        let new_group = OscPacket::Message(OscMessage {
            addr: "/g_new".to_string(),
            args: vec![OscValue::Int32((1000 + i) as i32), OscValue::Int32(0), OscValue::Int32(0)],
        });
        let bytes = encoder.encode(&new_group).to_vec();
        adaptor.send(
            &bytes,
            SendOptions { session_id: 1, run_tag: 7, audio_time_s: None, current_time_s: None },
        )?;
    }
    println!("   -> 3x /g_new (non-bundle bypass)");

    let scheduled = OscPacket::Message(OscMessage {
        addr: "/s_new".to_string(),
        args: vec![OscValue::Str("sine".to_string()), OscValue::Int32(2000)],
    });
    let bytes = encoder.encode(&scheduled).to_vec();
    let audio_time_s = 0.05;
    adaptor.send(
        &bytes,
        SendOptions { session_id: 1, run_tag: 7, audio_time_s: Some(audio_time_s), current_time_s: None },
    )?;
    println!("   -> /s_new scheduled {audio_time_s}s out (prescheduler)");

    tokio::time::sleep(Duration::from_millis(150)).await;

    println!("\nPhase 4: cancelling run_tag=7\n");
    adaptor.cancel_tag(7);

    println!("Phase 5: waiting for the engine to catch up\n");
    tokio::time::sleep(Duration::from_millis(200)).await;

    println!("Phase 6: final state\n");
    let metrics = adaptor.metrics();
    println!("   messages_sent:          {}", metrics.messages_sent);
    println!("   bypass_non_bundle:      {}", metrics.bypass_non_bundle);
    println!("   bypass_immediate:       {}", metrics.bypass_immediate);
    println!("   far_future_scheduled:   {}", metrics.far_future_scheduled);
    println!("   cancelled:              {}", metrics.cancelled);
    println!("   decode_failures:        {}", metrics.decode_failures);
    println!("   replies observed:       {}", replies_seen.load(Ordering::Relaxed));
    println!("   tree version:           {}", adaptor.tree_version());
    println!("   tree nodes:             {}", adaptor.get_tree().len());

    println!("\nPhase 7: shutting down\n");
    stop.store(true, Ordering::Relaxed);
    let engine_handled = engine.join().unwrap_or(0);
    println!("   engine processed {engine_handled} IN frames");
    adaptor.destroy().await?;
    println!("   adaptor destroyed\n");

    println!("Demo complete.\n");
    Ok(())
}

fn print_banner() {
    println!();
    println!("================================================================");
    println!("  SuperSonic host adaptor demo");
    println!("  shared-memory OSC transport over a simulated scsynth engine");
    println!("================================================================");
    println!();
}
