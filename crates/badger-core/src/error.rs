//! Error types for slice decoding.

use std::error::Error;
use std::fmt;

/// Errors from decoding a [`Slice`](crate::Slice) interpreted as hex text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SliceError {
    /// The hex text has an odd number of characters.
    OddHexLength {
        /// Length of the rejected input in bytes.
        len: usize,
    },
    /// A character outside `0-9`, `a-f`, `A-F` was found.
    InvalidHexDigit {
        /// Position of the offending character.
        index: usize,
        /// The offending byte.
        byte: u8,
    },
}

impl fmt::Display for SliceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OddHexLength { len } => {
                write!(f, "hex input has odd length {len}")
            }
            Self::InvalidHexDigit { index, byte } => {
                write!(f, "invalid hex digit 0x{byte:02x} at index {index}")
            }
        }
    }
}

impl Error for SliceError {}
