//! Write and drain algorithms over [`supersonic_region`]'s byte rings:
//! framing, the `IN` write lock, adaptive backoff, and corruption recovery.

pub mod error;
pub mod framing;

pub use crossbeam_utils::Backoff;
pub use error::RingError;
pub use framing::{
    drain_from, drain_in_log, drain_records, resync, write_in, write_in_blocking, write_record, RecordView,
};
