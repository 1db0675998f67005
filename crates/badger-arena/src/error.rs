//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The backing allocator could not provide a new block.
    OutOfMemory {
        /// Number of bytes the caller asked for.
        requested: usize,
        /// Size of the block the arena tried to acquire.
        block_size: usize,
    },
    /// A new block would take the arena past its configured memory limit.
    CapacityExceeded {
        /// Number of bytes the caller asked for.
        requested: usize,
        /// The configured limit in bytes.
        limit: usize,
    },
    /// The requested alignment is not a power of two.
    InvalidAlignment {
        /// The rejected alignment.
        alignment: usize,
    },
    /// An [`ArenaConfig`](crate::ArenaConfig) failed validation.
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
    /// `count * size_of::<T>()` does not fit in a valid layout.
    LayoutOverflow {
        /// Number of elements requested.
        count: usize,
        /// Size of one element in bytes.
        elem_size: usize,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory {
                requested,
                block_size,
            } => {
                write!(
                    f,
                    "out of memory: could not acquire a {block_size}-byte block for a {requested}-byte request"
                )
            }
            Self::CapacityExceeded { requested, limit } => {
                write!(
                    f,
                    "arena capacity exceeded: requested {requested} bytes, limit {limit} bytes"
                )
            }
            Self::InvalidAlignment { alignment } => {
                write!(f, "alignment {alignment} is not a power of two")
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid arena config: {reason}")
            }
            Self::LayoutOverflow { count, elem_size } => {
                write!(
                    f,
                    "layout overflow: {count} elements of {elem_size} bytes"
                )
            }
        }
    }
}

impl Error for ArenaError {}
