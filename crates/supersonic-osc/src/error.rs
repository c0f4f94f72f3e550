//! Codec error taxonomy (§7).

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Ran out of bytes while decoding a fixed-width field.
    #[error("truncated packet: wanted {wanted} bytes, had {available}")]
    Truncated { wanted: usize, available: usize },

    /// A type tag character is not one this codec understands.
    #[error("unsupported type tag {0:?}")]
    UnsupportedArg(char),

    /// A bundle's magic string was not `#bundle\0`.
    #[error("bad bundle magic")]
    BadMagic,

    /// Type-tag string did not start with `,`.
    #[error("type tag string missing leading comma")]
    BadTypeTag,

    /// A string argument's bytes were not valid UTF-8.
    #[error("string argument was not valid UTF-8")]
    StringNotUtf8,
}

impl CodecError {
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        false
    }
}
