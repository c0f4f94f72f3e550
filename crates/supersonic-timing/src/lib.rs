//! NTP-to-audio-clock anchoring and the bypass/prescheduler classifier.

pub mod anchor;
pub mod classifier;
pub mod clock;
pub mod error;

pub use anchor::TimingModel;
pub use classifier::{classify, Category};
pub use clock::{AudioClock, SystemWallClock, WallClock};
pub use error::TimingError;
