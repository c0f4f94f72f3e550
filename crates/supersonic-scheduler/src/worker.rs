//! The release-loop worker: periodically drains due entries from a
//! [`Prescheduler`] and hands them to a dispatch callback (§4.6).

use std::sync::Arc;
use std::time::Duration;

use supersonic_osc::OscPacket;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::prescheduler::Prescheduler;
use crate::shutdown::ShutdownSignal;

/// Tuning knobs for [`spawn_release_worker`].
#[derive(Debug, Clone, Copy)]
pub struct WorkerConfig {
    pub tick_interval: Duration,
    pub max_releases_per_tick: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(5),
            max_releases_per_tick: 4096,
        }
    }
}

/// Spawns the release-loop task. `now_ntp` is sampled fresh on every tick so
/// the worker tracks a timing model that keeps resyncing; `dispatch` is
/// called once per surviving, due entry; `on_tick` reports `(released,
/// cancelled)` after each tick so the caller can feed its own metrics (§8
/// S3 "`cancelled` metric").
pub fn spawn_release_worker(
    scheduler: Arc<Prescheduler>,
    config: WorkerConfig,
    now_ntp: impl Fn() -> f64 + Send + 'static,
    dispatch: impl Fn(OscPacket) + Send + Sync + 'static,
    on_tick: impl Fn(usize, usize) + Send + 'static,
    shutdown: ShutdownSignal,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(config.tick_interval);
        debug!("prescheduler release worker started");
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let now = now_ntp();
                    let (released, cancelled) = scheduler.release_due(now, config.max_releases_per_tick, |packet| {
                        dispatch(packet);
                    });
                    on_tick(released, cancelled);
                    if released + cancelled >= config.max_releases_per_tick {
                        warn!(released, cancelled, "prescheduler hit its per-tick release cap");
                    }
                }
                () = shutdown.wait() => {
                    let remaining = scheduler.len();
                    if remaining > 0 {
                        debug!(remaining, "prescheduler release worker stopping with entries still queued");
                    }
                    break;
                }
            }
        }
        debug!("prescheduler release worker stopped");
    })
}
