//! Host adaptor for the SuperSonic OSC transport (§4.9, §6).
//!
//! This crate is the single entry point an embedder talks to: it owns the
//! shared region, the timing model, the prescheduler, and every background
//! worker, and exposes a small `send`/`cancel`/`get_tree`/`on` surface over
//! them.
//!
//! # Example
//!
//! ```no_run
//! use supersonic_host::{HostAdaptor, HostConfig, SendOptions};
//!
//! # async fn demo() -> Result<(), supersonic_host::SuperSonicError> {
//! let adaptor = HostAdaptor::init(HostConfig::default()).await?;
//! adaptor.send_immediate(&[])?;
//! adaptor.destroy().await?;
//! # Ok(())
//! # }
//! ```

mod adaptor;
mod clock;
mod config;
mod error;

pub use adaptor::{HostAdaptor, SendOptions};
pub use clock::MonotonicAudioClock;
pub use config::{HostConfig, TransportMode};
pub use error::SuperSonicError;

pub use supersonic_inbound::{Event, EventKind, ListenerId};
pub use supersonic_region::{MetricsSnapshot, NodeEntry, SharedRegion};
