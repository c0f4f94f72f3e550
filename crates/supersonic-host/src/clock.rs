//! The adaptor's own [`AudioClock`] implementation.
//!
//! The real audio context clock lives with the engine (§6.1, an opaque
//! collaborator outside this crate's scope); an in-process host still needs
//! something to anchor against for its own demos and tests, so this models
//! the engine's "seconds since the context was created" contract with
//! `Instant`, which is monotonic regardless of wall-clock adjustments.

use std::sync::Arc;
use std::time::Instant;

use supersonic_timing::AudioClock;

pub struct MonotonicAudioClock {
    start: Instant,
}

impl MonotonicAudioClock {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self { start: Instant::now() })
    }
}

impl AudioClock for MonotonicAudioClock {
    fn now_seconds(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}
