//! Channel error taxonomy (§7): a single top-level type an embedder can
//! match on, wrapping the narrower errors the lower crates report.

use thiserror::Error;

use supersonic_ring::RingError;
use supersonic_scheduler::SchedulerError;
use supersonic_timing::TimingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("ring write failed: {0}")]
    Ring(#[from] RingError),

    #[error("prescheduler rejected entry: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("timing error: {0}")]
    Timing(#[from] TimingError),

    #[error("channel has been closed")]
    Closed,
}

impl ChannelError {
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            ChannelError::Ring(e) => e.is_recoverable(),
            ChannelError::Scheduler(e) => e.is_recoverable(),
            ChannelError::Timing(_) => false,
            ChannelError::Closed => false,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        match self {
            ChannelError::Ring(e) => e.is_terminal(),
            ChannelError::Scheduler(e) => e.is_terminal(),
            ChannelError::Timing(_) => false,
            ChannelError::Closed => true,
        }
    }
}
