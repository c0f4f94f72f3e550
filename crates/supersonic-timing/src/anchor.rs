//! NTP-to-audio-clock anchor computation and periodic drift correction
//! (§4.4).
//!
//! `ntp_start` is the NTP timestamp that corresponds to audio-context time
//! zero: `wall_ntp(now) - context_time(now)`. Once established, any audio
//! context time converts to NTP (and back) by adding (subtracting) this one
//! constant, until a resync nudges it to account for clock drift.

use std::sync::Arc;

use supersonic_region::TimingState;
use tracing::{debug, warn};

use crate::clock::{AudioClock, WallClock};
use crate::error::TimingError;

/// Calibration samples taken when first establishing the anchor. Several
/// close-together samples, keeping the one with the smallest wall/audio
/// read gap, reduces the jitter a single sample would carry (§4.4
/// "busy-wait" anchor establishment).
const CALIBRATION_SAMPLES: u32 = 8;

fn sample_once(wall: &dyn WallClock, audio: &dyn AudioClock) -> (f64, f64) {
    let before = audio.now_seconds();
    let ntp = wall.now_ntp_seconds();
    let after = audio.now_seconds();
    let gap = after - before;
    (ntp - (before + after) / 2.0, gap)
}

/// Computes a fresh anchor by busy-waiting through [`CALIBRATION_SAMPLES`]
/// back-to-back reads and keeping the tightest one.
fn calibrate(wall: &dyn WallClock, audio: &dyn AudioClock) -> f64 {
    let mut best = sample_once(wall, audio);
    for _ in 1..CALIBRATION_SAMPLES {
        let candidate = sample_once(wall, audio);
        if candidate.1 < best.1 {
            best = candidate;
        }
    }
    best.0
}

pub struct TimingModel {
    wall: Arc<dyn WallClock>,
    audio: Arc<dyn AudioClock>,
}

impl TimingModel {
    #[must_use]
    pub fn new(wall: Arc<dyn WallClock>, audio: Arc<dyn AudioClock>) -> Self {
        Self { wall, audio }
    }

    /// Establishes the initial anchor. Idempotent: calling it again simply
    /// recalibrates.
    pub fn establish(&self, state: &TimingState) {
        let ntp_start = calibrate(self.wall.as_ref(), self.audio.as_ref());
        state.publish_anchor(ntp_start);
        debug!(ntp_start, "timing anchor established");
    }

    /// Recalibrates and publishes drift relative to the previous anchor
    /// (§4.4 "periodic drift correction"). Returns the observed drift in
    /// milliseconds.
    pub fn resync(&self, state: &TimingState) -> i32 {
        let new_anchor = calibrate(self.wall.as_ref(), self.audio.as_ref());
        let previous = state.read_anchor().unwrap_or(new_anchor);
        let drift_ms = ((new_anchor - previous) * 1000.0).round() as i32;
        state.publish_anchor(new_anchor);
        state.set_drift_ms(drift_ms);
        if drift_ms.abs() > 50 {
            warn!(drift_ms, "large clock drift observed during resync");
        }
        drift_ms
    }

    pub fn audio_to_ntp(&self, state: &TimingState, audio_time: f64) -> Result<f64, TimingError> {
        let anchor = state.read_anchor().ok_or(TimingError::NotAnchored)?;
        let drift_s = f64::from(state.drift_ms()) / 1000.0;
        let offset_s = f64::from(state.global_offset_ms()) / 1000.0;
        Ok(anchor + audio_time + drift_s + offset_s)
    }

    pub fn ntp_to_audio(&self, state: &TimingState, ntp_time: f64) -> Result<f64, TimingError> {
        let anchor = state.read_anchor().ok_or(TimingError::NotAnchored)?;
        let drift_s = f64::from(state.drift_ms()) / 1000.0;
        let offset_s = f64::from(state.global_offset_ms()) / 1000.0;
        Ok(ntp_time - anchor - drift_s - offset_s)
    }

    #[must_use]
    pub fn now_audio_seconds(&self) -> f64 {
        self.audio.now_seconds()
    }
}
