//! OSC 1.0 codec: typed values, messages, bundles, timetags, and the
//! encode/decode pair used throughout the transport.

pub mod addr_cache;
pub mod codec;
pub mod constants;
pub mod error;
pub mod value;

pub use addr_cache::AddressCache;
pub use codec::{decode, Encoder};
pub use error::CodecError;
pub use value::{OscBundle, OscMessage, OscPacket, OscValue, TimeTag, TimeTagInput};
