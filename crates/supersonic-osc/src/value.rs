//! OSC data model (§4.3, §6.2): typed arguments, messages, bundles, and
//! timetags.

use crate::constants::NTP_EPOCH_OFFSET;

/// NTP-format 64-bit timetag: seconds since 1900-01-01, plus a fractional
/// part in units of 1/2^32 seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeTag {
    pub seconds: u32,
    pub fraction: u32,
}

impl TimeTag {
    /// The reserved "dispatch immediately" sentinel (seconds=0, fraction=1).
    pub const IMMEDIATE: TimeTag = TimeTag { seconds: 0, fraction: 1 };

    /// A literal `(0, 0)` is also treated as immediate by the classifier
    /// (§4.5), even though it is not the canonical sentinel.
    #[must_use]
    pub fn is_immediate(self) -> bool {
        self == Self::IMMEDIATE || (self.seconds == 0 && self.fraction == 0)
    }

    #[must_use]
    pub fn from_ntp_seconds(ntp_seconds: f64) -> Self {
        let seconds = ntp_seconds.trunc().max(0.0) as u32;
        let fraction = (ntp_seconds.fract() * f64::from(u32::MAX)) as u32;
        Self { seconds, fraction }
    }

    #[must_use]
    pub fn to_ntp_seconds(self) -> f64 {
        f64::from(self.seconds) + f64::from(self.fraction) / f64::from(u32::MAX)
    }

    #[must_use]
    pub fn from_unix_seconds(unix_seconds: f64) -> Self {
        Self::from_ntp_seconds(unix_seconds + NTP_EPOCH_OFFSET)
    }

    #[must_use]
    pub fn to_unix_seconds(self) -> f64 {
        self.to_ntp_seconds() - NTP_EPOCH_OFFSET
    }
}

/// The forms a caller may hand in for a bundle's timetag (§6.2 "timetag
/// input handling"). Resolved to a [`TimeTag`] by [`TimeTagInput::resolve`].
#[derive(Debug, Clone, Copy)]
pub enum TimeTagInput {
    /// `1`, `null`, or `undefined` on the JS side: dispatch immediately.
    Immediate,
    /// An explicit `(seconds, fraction)` pair, taken verbatim.
    Raw(u32, u32),
    /// A floating-point NTP seconds value, split into seconds/fraction.
    NtpSeconds(f64),
    /// A value that looks like a Unix timestamp (roughly year 2001-2106)
    /// rather than an NTP one; accepted, but flagged for the caller to log.
    LikelyUnixSeconds(f64),
}

impl TimeTagInput {
    /// Heuristic: NTP epoch seconds for "now" are offset from Unix epoch
    /// seconds by [`NTP_EPOCH_OFFSET`]. A tag smaller than that offset is
    /// more likely a Unix timestamp someone forgot to convert.
    const UNIX_HEURISTIC_THRESHOLD: f64 = NTP_EPOCH_OFFSET;

    #[must_use]
    pub fn classify_seconds(value: f64) -> Self {
        if value > 0.0 && value < Self::UNIX_HEURISTIC_THRESHOLD {
            TimeTagInput::LikelyUnixSeconds(value)
        } else {
            TimeTagInput::NtpSeconds(value)
        }
    }

    #[must_use]
    pub fn resolve(self) -> TimeTag {
        match self {
            TimeTagInput::Immediate => TimeTag::IMMEDIATE,
            TimeTagInput::Raw(seconds, fraction) => TimeTag { seconds, fraction },
            TimeTagInput::NtpSeconds(s) => TimeTag::from_ntp_seconds(s),
            TimeTagInput::LikelyUnixSeconds(s) => TimeTag::from_unix_seconds(s),
        }
    }
}

/// One OSC-typed argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum OscValue {
    Int32(i32),
    Float32(f32),
    Int64(i64),
    Float64(f64),
    Str(String),
    Blob(Vec<u8>),
    Bool(bool),
    Time(TimeTag),
    Nil,
}

impl OscValue {
    #[must_use]
    pub fn type_tag(&self) -> char {
        match self {
            OscValue::Int32(_) => 'i',
            OscValue::Float32(_) => 'f',
            OscValue::Int64(_) => 'h',
            OscValue::Float64(_) => 'd',
            OscValue::Str(_) => 's',
            OscValue::Blob(_) => 'b',
            OscValue::Bool(true) => 'T',
            OscValue::Bool(false) => 'F',
            OscValue::Time(_) => 't',
            OscValue::Nil => 'N',
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OscMessage {
    pub addr: String,
    pub args: Vec<OscValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OscBundle {
    pub time: TimeTag,
    pub packets: Vec<OscPacket>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OscPacket {
    Message(OscMessage),
    Bundle(OscBundle),
}

impl OscPacket {
    /// The bundle's timetag if this packet is a bundle, otherwise
    /// [`TimeTag::IMMEDIATE`] (a bare message always dispatches now, §4.5
    /// "non-bundle bypass").
    #[must_use]
    pub fn timetag(&self) -> TimeTag {
        match self {
            OscPacket::Message(_) => TimeTag::IMMEDIATE,
            OscPacket::Bundle(b) => b.time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediate_sentinel_and_zero_zero_both_count_as_immediate() {
        assert!(TimeTag::IMMEDIATE.is_immediate());
        assert!(TimeTag { seconds: 0, fraction: 0 }.is_immediate());
        assert!(!TimeTag { seconds: 1, fraction: 0 }.is_immediate());
    }

    #[test]
    fn ntp_seconds_round_trip_is_approximately_exact() {
        let tag = TimeTag::from_ntp_seconds(1_000_000.25);
        let back = tag.to_ntp_seconds();
        assert!((back - 1_000_000.25).abs() < 1e-6);
    }

    #[test]
    fn unix_heuristic_flags_small_values() {
        match TimeTagInput::classify_seconds(1_700_000_000.0) {
            TimeTagInput::LikelyUnixSeconds(_) => {}
            other => panic!("expected LikelyUnixSeconds, got {other:?}"),
        }
        match TimeTagInput::classify_seconds(3_800_000_000.0) {
            TimeTagInput::NtpSeconds(_) => {}
            other => panic!("expected NtpSeconds, got {other:?}"),
        }
    }
}
