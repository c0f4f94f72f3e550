//! Outbound traffic classifier (§4.5): decides whether a packet bypasses
//! straight to the engine or is handed to the prescheduler.

use supersonic_osc::{OscPacket, TimeTag};

/// Classification outcome for one outbound packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Not a bundle at all: always dispatched immediately.
    NonBundle,
    /// A bundle whose timetag is the immediate sentinel (`(0,1)`) or the
    /// literal `(0,0)`.
    Immediate,
    /// A bundle scheduled within the lookahead window: bypasses the
    /// prescheduler and is dispatched directly, relying on the engine's own
    /// timing.
    NearFuture,
    /// A bundle whose scheduled time has already passed.
    Late,
    /// A bundle scheduled far enough out that it needs the prescheduler.
    FarFuture,
}

impl Category {
    #[must_use]
    pub fn is_bypass(self) -> bool {
        !matches!(self, Category::FarFuture)
    }
}

/// Classifies `packet` given the current audio-context time and a
/// conversion from NTP seconds to audio seconds.
///
/// `ntp_to_audio` is injected rather than taking a `TimingModel` directly so
/// this function stays pure and easy to test; callers in `supersonic-channel`
/// wire it to [`crate::TimingModel::ntp_to_audio`].
pub fn classify(
    packet: &OscPacket,
    now_audio_seconds: f64,
    lookahead_s: f64,
    ntp_to_audio: impl Fn(f64) -> f64,
) -> Category {
    let OscPacket::Bundle(bundle) = packet else {
        return Category::NonBundle;
    };

    if bundle.time.is_immediate() {
        return Category::Immediate;
    }

    let target_audio = ntp_to_audio(bundle.time.to_ntp_seconds());
    let delta = target_audio - now_audio_seconds;

    if delta < 0.0 {
        Category::Late
    } else if delta <= lookahead_s {
        Category::NearFuture
    } else {
        Category::FarFuture
    }
}
