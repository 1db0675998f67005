//! Slices, cleanup chains, and shared cleanup handles for Badger.
//!
//! This is the leaf crate of the workspace. It defines the types that tie
//! buffer lifetimes to release actions:
//!
//! - [`Slice`]: a borrowed `(pointer, length)` view with byte-wise ordering
//!   and a hex codec.
//! - [`Cleanable`]: an ordered, fire-once chain of deferred cleanups that
//!   can be delegated wholesale to another chain.
//! - [`SharedCleanablePtr`]: an atomically counted handle to one chain,
//!   run once after every sharer has released it.
//! - [`PinnableSlice`]: a slice that either owns a private copy or is pinned
//!   to external memory together with the cleanup that releases it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod cleanable;
pub mod error;
pub mod hex;
pub mod pinnable;
pub mod shared;
pub mod slice;

pub use cleanable::{AsCleanable, Cleanable, CleanupFn};
pub use error::SliceError;
pub use pinnable::PinnableSlice;
pub use shared::SharedCleanablePtr;
pub use slice::Slice;
