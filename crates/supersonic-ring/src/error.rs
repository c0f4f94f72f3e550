//! Error taxonomy for ring writes and drains (§7).

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingError {
    /// Not enough free space for this record, even after wrap padding.
    #[error("ring is full")]
    Full,

    /// The `IN` write lock was held by another producer.
    #[error("write lock is held by another producer")]
    LockBusy,

    /// The ring has been torn down and is no longer accepting writes.
    #[error("ring is closed")]
    Closed,

    /// Payload would not fit in the ring even when empty.
    #[error("record of {0} bytes exceeds ring capacity")]
    RecordTooLarge(u32),

    /// A frame header failed to parse as either a message or padding marker.
    #[error("corrupt frame header at ring offset {0}")]
    Corrupt(u32),
}

impl RingError {
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Full | Self::LockBusy)
    }

    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}
