//! Clock sources the timing model anchors between (§4.4).
//!
//! Host audio runtime buffer mechanics are out of scope; `AudioClock` models
//! only the interface the timing model needs from it (a monotonically
//! increasing context time in seconds since the engine started).

use std::time::{SystemTime, UNIX_EPOCH};

use supersonic_osc::constants::NTP_EPOCH_OFFSET;

/// Real-world wall-clock time, expressed in NTP seconds.
pub trait WallClock: Send + Sync {
    fn now_ntp_seconds(&self) -> f64;
}

/// The embedding engine's audio context clock: seconds since the context
/// was created, monotonic and independent of wall-clock drift.
pub trait AudioClock: Send + Sync {
    fn now_seconds(&self) -> f64;
}

/// `WallClock` backed by [`SystemTime::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemWallClock;

impl WallClock for SystemWallClock {
    fn now_ntp_seconds(&self) -> f64 {
        let unix_seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is before the Unix epoch")
            .as_secs_f64();
        unix_seconds + NTP_EPOCH_OFFSET
    }
}
