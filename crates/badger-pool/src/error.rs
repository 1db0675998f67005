//! Thread pool error types.

use std::error::Error;
use std::fmt;

/// Errors from creating or feeding a [`ThreadPool`](crate::ThreadPool).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoolError {
    /// A pool needs at least one worker thread.
    InvalidThreadCount,
    /// The pool has been shut down and accepts no more tasks.
    ShutDown,
    /// The operating system refused to start a worker thread.
    Spawn {
        /// Description of the underlying I/O error.
        reason: String,
    },
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidThreadCount => write!(f, "thread pool needs at least one thread"),
            Self::ShutDown => write!(f, "thread pool is shut down"),
            Self::Spawn { reason } => write!(f, "failed to spawn worker thread: {reason}"),
        }
    }
}

impl Error for PoolError {}
