//! Far-future bundle prescheduler: priority queue, cancellation index, and
//! the async release-loop worker.

pub mod cancel_index;
pub mod entry;
pub mod error;
pub mod prescheduler;
pub mod shutdown;
pub mod worker;

pub use cancel_index::CancellationIndex;
pub use entry::CancelKey;
pub use error::SchedulerError;
pub use prescheduler::Prescheduler;
pub use shutdown::ShutdownSignal;
pub use worker::{spawn_release_worker, WorkerConfig};
