//! Top-level error type (§7): each lower crate keeps its own narrow error
//! enum; callers at the host boundary match on this one instead.

use supersonic_channel::ChannelError;
use supersonic_osc::CodecError;
use supersonic_ring::RingError;
use supersonic_scheduler::SchedulerError;
use supersonic_timing::TimingError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SuperSonicError {
    #[error("ring error: {0}")]
    Ring(#[from] RingError),

    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("timing error: {0}")]
    Timing(#[from] TimingError),

    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("malformed inbound or outbound OSC packet: {0}")]
    Codec(#[from] CodecError),

    #[error("buffer allocation failed: {0}")]
    AllocationFailed(String),

    #[error("load timed out after {0:?}")]
    LoadTimeout(std::time::Duration),

    #[error("worker failed to start within {0:?}")]
    WorkerInitTimeout(std::time::Duration),

    #[error("operation attempted on a destroyed host adaptor")]
    StateMisuse,
}

impl SuperSonicError {
    /// Whether the call can reasonably be retried (§7 policy: never abort a
    /// worker, never silently lose a record).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            SuperSonicError::Ring(e) => e.is_recoverable(),
            SuperSonicError::Scheduler(_) | SuperSonicError::Channel(_) => true,
            SuperSonicError::Timing(_) | SuperSonicError::Codec(_) => true,
            SuperSonicError::AllocationFailed(_) | SuperSonicError::LoadTimeout(_) => false,
            SuperSonicError::WorkerInitTimeout(_) | SuperSonicError::StateMisuse => false,
        }
    }
}
