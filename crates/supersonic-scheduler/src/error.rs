//! Prescheduler error taxonomy (§7).

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// The prescheduler heap is at `prescheduler_capacity` (§6.3).
    #[error("prescheduler is full")]
    Full,

    /// The scheduler has been shut down and no longer accepts new entries.
    #[error("scheduler has been shut down")]
    ShutDown,
}

impl SchedulerError {
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Full)
    }

    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ShutDown)
    }
}
