//! Inbound pipeline (§4.8): reply/debug ring readers, the tree-mirror
//! change detector, and the listener registry they dispatch through.

pub mod debug;
pub mod reader;
pub mod registry;
pub mod reply;
pub mod tree;

pub use debug::poll_debug;
pub use registry::{Event, EventKind, ListenerId, ListenerRegistry};
pub use reply::poll_replies;
pub use tree::TreeReader;
