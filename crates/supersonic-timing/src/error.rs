//! Timing error taxonomy (§7).

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimingError {
    /// An NTP conversion was attempted before `anchor()` published a value.
    #[error("timing anchor has not been established yet")]
    NotAnchored,
}
