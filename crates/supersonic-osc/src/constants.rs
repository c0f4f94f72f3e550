//! Codec-level constants (§4.3, §6.2).

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch (1970-01-01).
pub const NTP_EPOCH_OFFSET: f64 = 2_208_988_800.0;

/// Bundle magic string, NUL-terminated, per the OSC 1.0 spec.
pub const BUNDLE_MAGIC: &[u8; 8] = b"#bundle\0";

/// Maximum nesting depth a decoded bundle may have (§4.3 "bundles nested to
/// depth 10+"); guards against malformed input causing unbounded recursion.
pub const MAX_BUNDLE_DEPTH: usize = 64;

/// Blobs up to this size are expected to round-trip correctly (§4.3).
pub const MAX_BLOB_SIZE: usize = 8 * 1024 * 1024;

/// Capacity of the address-string LRU (§4.3 "address LRU, <=1000 entries").
pub const ADDRESS_CACHE_CAPACITY: usize = 1000;
