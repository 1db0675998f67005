//! Badger: the memory-lifetime substrate of an embedded key-value store.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Badger sub-crates. For most users, adding `badger` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use badger::prelude::*;
//!
//! // Bulk-allocate keys the way a memtable does.
//! let arena = Arena::with_block_size(4096).unwrap();
//! let key = arena.copy_slice(Slice::from("user:42")).unwrap();
//! assert!(key.starts_with(&Slice::from("user:")));
//!
//! // Hand out a cached value without copying; release the entry later.
//! let entry = Arc::new(b"payload".to_vec());
//! let held = Arc::clone(&entry);
//! let mut value = PinnableSlice::new();
//! value.pin_slice(Slice::from(entry.as_slice()), move || drop(held));
//! assert_eq!(value.as_slice(), "payload");
//! assert_eq!(Arc::strong_count(&entry), 2);
//! value.reset();
//! assert_eq!(Arc::strong_count(&entry), 1);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `badger-core` | `Slice`, `Cleanable`, `SharedCleanablePtr`, `PinnableSlice`, hex codec |
//! | [`arena`] | `badger-arena` | `Arena`, growth policies, backing allocators |
//! | [`pool`] | `badger-pool` | `ThreadPool` and the `Executor` trait |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Block-based bump allocation (`badger-arena`).
///
/// [`arena::Arena`] is the main type; back it with a custom
/// [`arena::BlockAllocator`] to control where blocks come from.
pub use badger_arena as arena;

/// Slices and cleanup chains (`badger-core`).
///
/// Contains [`types::Slice`], [`types::Cleanable`],
/// [`types::SharedCleanablePtr`], [`types::PinnableSlice`] and the
/// [`types::hex`] codec.
pub use badger_core as types;

/// Fixed-size worker thread pool (`badger-pool`).
pub use badger_pool as pool;

/// Common imports for typical Badger usage.
///
/// ```rust
/// use badger::prelude::*;
/// ```
pub mod prelude {
    // Arena
    pub use badger_arena::{Arena, ArenaConfig, GrowthPolicy};

    // Slices and cleanup
    pub use badger_core::{AsCleanable, Cleanable, PinnableSlice, SharedCleanablePtr, Slice};

    // Errors
    pub use badger_arena::ArenaError;
    pub use badger_core::SliceError;
    pub use badger_pool::PoolError;

    // Pool
    pub use badger_pool::{Executor, ThreadPool};
}
