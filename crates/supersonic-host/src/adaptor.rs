//! The host adaptor (§4.9, §6.3): wires the region, timing model,
//! prescheduler, inbound readers, and channels together, and is the single
//! object an embedder talks to.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use supersonic_channel::{Channel, ChannelConfig};
use supersonic_inbound::{poll_debug, poll_replies, Event, EventKind, ListenerId, ListenerRegistry, TreeReader};
use supersonic_osc::{decode, OscPacket};
use supersonic_region::{MetricsSnapshot, NodeEntry, RegionConfig, SharedRegion};
use supersonic_scheduler::{spawn_release_worker, Prescheduler, ShutdownSignal, WorkerConfig};
use supersonic_timing::{SystemWallClock, TimingModel};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info};

use crate::clock::MonotonicAudioClock;
use crate::config::{HostConfig, TransportMode};
use crate::error::SuperSonicError;

const MAIN_CHANNEL_SOURCE_ID: u32 = 0;
const READER_TICK: Duration = Duration::from_millis(10);
const READER_MAX_RECORDS: usize = 256;

/// Per-call overrides for [`HostAdaptor::send`] (§6.3). `session_id` and
/// `run_tag` scope cancellation; an explicit `audio_time_s` routes the
/// packet to the prescheduler at that audio-clock time regardless of the
/// packet's own embedded timetag.
#[derive(Debug, Clone, Copy, Default)]
pub struct SendOptions {
    pub session_id: u32,
    pub run_tag: u32,
    pub audio_time_s: Option<f64>,
    pub current_time_s: Option<f64>,
}

pub struct HostAdaptor {
    region: Arc<SharedRegion>,
    scheduler: Arc<Prescheduler>,
    timing: Arc<TimingModel>,
    registry: Arc<ListenerRegistry>,
    mode: TransportMode,
    main_channel: std::sync::Mutex<Channel>,
    next_worker_source_id: AtomicU32,
    shutdown: ShutdownSignal,
    worker_handles: std::sync::Mutex<Vec<JoinHandle<()>>>,
    destroyed: AtomicBool,
}

impl HostAdaptor {
    /// Allocates the region, anchors the timing model, spawns the reply,
    /// debug, and prescheduler-release workers (plus, in shared-memory
    /// mode, the `IN` log-sniffer), and hands back a ready adaptor. Must be
    /// called from within a Tokio runtime.
    pub async fn init(config: HostConfig) -> Result<Self, SuperSonicError> {
        let region_config = RegionConfig {
            in_ring_capacity: config.in_ring_capacity,
            out_ring_capacity: config.out_ring_capacity,
            debug_ring_capacity: config.debug_ring_capacity,
            node_tree_capacity: config.node_tree_capacity,
            prescheduler_capacity: config.prescheduler_capacity,
            max_buffers: config.max_buffers,
            audio_capture: None,
        };
        let region = Arc::new(SharedRegion::new(&region_config));

        let wall = Arc::new(SystemWallClock);
        let audio = MonotonicAudioClock::new();
        let timing = Arc::new(TimingModel::new(wall, audio));
        timing.establish(&region.timing);

        let scheduler = Arc::new(Prescheduler::new(config.prescheduler_capacity));
        let registry = Arc::new(ListenerRegistry::new());
        let shutdown = scheduler.shutdown_signal();

        let main_channel = Self::make_channel(
            config.mode,
            Arc::clone(&region),
            Arc::clone(&scheduler),
            Arc::clone(&timing),
            ChannelConfig {
                source_id: MAIN_CHANNEL_SOURCE_ID,
                lookahead_s: config.bypass_lookahead_s,
            },
        );

        let adaptor = Self {
            region,
            scheduler,
            timing,
            registry,
            mode: config.mode,
            main_channel: std::sync::Mutex::new(main_channel),
            next_worker_source_id: AtomicU32::new(1),
            shutdown,
            worker_handles: std::sync::Mutex::new(Vec::new()),
            destroyed: AtomicBool::new(false),
        };

        adaptor.spawn_workers(&config);
        adaptor.registry.dispatch(&Event::Ready);
        info!(mode = ?config.mode, "host adaptor ready");
        Ok(adaptor)
    }

    fn spawn_workers(&self, config: &HostConfig) {
        let mut handles = self.worker_handles.lock().unwrap();

        let release_shutdown = self.shutdown.clone();
        let release_scheduler = Arc::clone(&self.scheduler);
        let release_timing = Arc::clone(&self.timing);
        let release_region = Arc::clone(&self.region);
        let dispatch_region = Arc::clone(&self.region);
        let metrics_region = Arc::clone(&self.region);
        handles.push(spawn_release_worker(
            release_scheduler,
            WorkerConfig::default(),
            move || {
                let now_audio = release_timing.now_audio_seconds();
                release_timing
                    .audio_to_ntp(&release_region.timing, now_audio)
                    .expect("timing anchor is established before workers spawn")
            },
            move |packet| dispatch_released_packet(&dispatch_region, &packet),
            move |_released, cancelled| {
                if cancelled > 0 {
                    metrics_region.metrics.add_cancelled(cancelled as u32);
                }
            },
            release_shutdown,
        ));

        handles.push(self.spawn_ring_reader_worker("reply", self.shutdown.clone(), {
            let region = Arc::clone(&self.region);
            let registry = Arc::clone(&self.registry);
            move || {
                if let Err(err) = poll_replies(&region, READER_MAX_RECORDS, &registry) {
                    error!(error = %err, "reply reader hit a ring error");
                }
            }
        }));

        handles.push(self.spawn_ring_reader_worker("debug", self.shutdown.clone(), {
            let region = Arc::clone(&self.region);
            let registry = Arc::clone(&self.registry);
            move || {
                if let Err(err) = poll_debug(&region, READER_MAX_RECORDS, &registry) {
                    error!(error = %err, "debug reader hit a ring error");
                }
            }
        }));

        handles.push(self.spawn_ring_reader_worker("tree", self.shutdown.clone(), {
            let region = Arc::clone(&self.region);
            let registry = Arc::clone(&self.registry);
            let tree_reader = TreeReader::new();
            move || {
                tree_reader.poll_tree(&region.node_tree, &registry);
            }
        }));

        if config.mode == crate::config::TransportMode::Shared {
            handles.push(self.spawn_ring_reader_worker("log_sniffer", self.shutdown.clone(), {
                let region = Arc::clone(&self.region);
                move || {
                    // Non-destructive tail for debugging/tracing only; the
                    // engine is the real consumer of `IN`.
                    let result = supersonic_ring::drain_in_log(&region.in_ring, READER_MAX_RECORDS, |_record| {});
                    if let Err(err) = result {
                        debug!(error = %err, "IN log-sniffer skipped a corrupt frame");
                    }
                }
            }));
        }
    }

    fn spawn_ring_reader_worker(
        &self,
        name: &'static str,
        shutdown: ShutdownSignal,
        mut tick: impl FnMut() + Send + 'static,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(READER_TICK);
            debug!(worker = name, "reader worker started");
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        tick();
                    }
                    () = shutdown.wait() => {
                        break;
                    }
                }
            }
            debug!(worker = name, "reader worker stopped");
        })
    }

    fn require_open(&self) -> Result<(), SuperSonicError> {
        if self.destroyed.load(Ordering::Acquire) {
            return Err(SuperSonicError::StateMisuse);
        }
        Ok(())
    }

    /// The underlying region. Exposed for callers that need to simulate or
    /// observe the engine side directly (demos, integration tests); ordinary
    /// embedders should prefer `send`/`get_tree`/`on`.
    #[must_use]
    pub fn region(&self) -> &Arc<SharedRegion> {
        &self.region
    }

    /// Builds a channel using the region's configured transport mode —
    /// shared-memory rings, or port-based message passing (§9).
    fn make_channel(
        mode: TransportMode,
        region: Arc<SharedRegion>,
        scheduler: Arc<Prescheduler>,
        timing: Arc<TimingModel>,
        config: ChannelConfig,
    ) -> Channel {
        match mode {
            TransportMode::Shared => Channel::new_shared_memory(region, scheduler, timing, config),
            TransportMode::Message => Channel::new_message_passing(region, scheduler, timing, config),
        }
    }

    /// Hands out a fresh worker channel at the next `source_id` (§4.9 "worker
    /// channels at 1..").
    #[must_use]
    pub fn new_worker_channel(&self) -> Channel {
        let source_id = self.next_worker_source_id.fetch_add(1, Ordering::Relaxed);
        Self::make_channel(
            self.mode,
            Arc::clone(&self.region),
            Arc::clone(&self.scheduler),
            Arc::clone(&self.timing),
            ChannelConfig { source_id, lookahead_s: 0.2 },
        )
    }

    /// Decodes `bytes` as OSC and routes it through the main channel (§6.3
    /// `send`). An explicit `audio_time_s` always schedules via the
    /// prescheduler at that time; otherwise the packet's own timetag drives
    /// classification.
    pub fn send(&self, bytes: &[u8], opts: SendOptions) -> Result<(), SuperSonicError> {
        self.require_open()?;
        let packet = decode(bytes)?;
        let mut channel = self.main_channel.lock().unwrap();
        if let Some(audio_time_s) = opts.audio_time_s {
            let release_ntp = self.timing.audio_to_ntp(&self.region.timing, audio_time_s)?;
            channel.send_to_prescheduler(opts.session_id, opts.run_tag, release_ntp, packet)?;
        } else {
            channel.send(opts.session_id, opts.run_tag, packet)?;
        }
        Ok(())
    }

    /// Forces bypass regardless of the packet's timetag (§6.3
    /// `send_immediate`).
    pub fn send_immediate(&self, bytes: &[u8]) -> Result<(), SuperSonicError> {
        self.require_open()?;
        let packet = decode(bytes)?;
        let mut channel = self.main_channel.lock().unwrap();
        channel.send_direct(&packet)?;
        Ok(())
    }

    pub fn cancel_session_tag(&self, session_id: u32, run_tag: u32) {
        self.main_channel.lock().unwrap().cancel_session_tag(session_id, run_tag);
    }

    pub fn cancel_session(&self, session_id: u32) {
        self.main_channel.lock().unwrap().cancel_session(session_id);
    }

    pub fn cancel_tag(&self, run_tag: u32) {
        self.main_channel.lock().unwrap().cancel_tag(run_tag);
    }

    pub fn cancel_all(&self) {
        self.main_channel.lock().unwrap().cancel_all();
    }

    /// Snapshot of the node-tree mirror, with empty slots filtered out
    /// (§4.8 "tree-mirror reader").
    #[must_use]
    pub fn get_tree(&self) -> Vec<NodeEntry> {
        self.region
            .node_tree
            .read_snapshot()
            .into_iter()
            .filter(|entry| !entry.is_empty_slot())
            .collect()
    }

    /// The unfiltered mirror snapshot, including any empty-slot sentinel
    /// rows the writer left behind.
    #[must_use]
    pub fn get_raw_tree(&self) -> Vec<NodeEntry> {
        self.region.node_tree.read_snapshot()
    }

    #[must_use]
    pub fn tree_version(&self) -> u32 {
        self.region.node_tree.version()
    }

    #[must_use]
    pub fn tree_dropped_count(&self) -> u32 {
        self.region.node_tree.dropped_count()
    }

    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.region.metrics.snapshot()
    }

    pub fn on(&self, kind: EventKind, handler: impl Fn(&Event) + Send + Sync + 'static) -> ListenerId {
        self.registry.on(kind, handler)
    }

    pub fn off(&self, kind: EventKind, id: ListenerId) {
        self.registry.off(kind, id);
    }

    #[must_use]
    pub fn next_node_id(&self) -> u32 {
        self.main_channel.lock().unwrap().next_node_id()
    }

    /// Tears everything down: signals every worker to stop, joins them, and
    /// marks the adaptor as destroyed so further calls fail with
    /// `StateMisuse` instead of silently doing nothing (§4.9 "tear down").
    pub async fn destroy(&self) -> Result<(), SuperSonicError> {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.registry.dispatch(&Event::Shutdown);
        self.shutdown.shutdown();
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut self.worker_handles.lock().unwrap());
        for handle in handles {
            let _ = handle.await;
        }
        info!("host adaptor destroyed");
        Ok(())
    }
}

/// Writes a prescheduler release straight to `IN` — the packet already
/// survived classification and scheduling, so it bypasses `Channel` here.
fn dispatch_released_packet(region: &SharedRegion, packet: &OscPacket) {
    let mut encoder = supersonic_osc::Encoder::new();
    let bytes = encoder.encode(packet);
    let len = bytes.len() as u32;
    match supersonic_ring::write_in_blocking(&region.in_ring, bytes, MAIN_CHANNEL_SOURCE_ID) {
        Ok(_) => {
            region.metrics.add_messages_sent(1);
            region.metrics.add_bytes_sent(len);
        }
        Err(err) => {
            error!(error = %err, "prescheduler release could not write to the IN ring");
        }
    }
}
