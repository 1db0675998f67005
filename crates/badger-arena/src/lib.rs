//! Block-based bump allocation for Badger.
//!
//! An [`Arena`] hands out memory by advancing a cursor through large
//! blocks obtained from a [`BlockAllocator`]. Individual allocations are
//! never freed; the whole arena is rewound with [`Arena::reset`] or
//! released when dropped. This is the allocation pattern of a memtable:
//! many small writes, one bulk release.
//!
//! # Architecture
//!
//! ```text
//! Arena<A: BlockAllocator>
//! ├── ArenaConfig (initial block size, GrowthPolicy, memory limit)
//! ├── RefCell<ArenaState>
//! │   ├── Block[]          (index-addressed, bump cursor each)
//! │   └── BTreeSet<(available, index)>  (most-available-first probing)
//! └── A                    (SystemAllocator by default)
//! ```
//!
//! # Unsafe code
//!
//! Pointer arithmetic is confined to the private `raw` module, the
//! [`alloc`] module's allocator trait, and the block type. Every `unsafe`
//! block carries a `// SAFETY:` comment.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod align;
pub mod alloc;
pub mod arena;
mod block;
pub mod config;
pub mod error;
mod raw;

// Public re-exports for the primary API surface.
pub use align::{MAX_ALIGN, MAX_BLOCK_ALIGN};
pub use alloc::{BlockAllocator, SystemAllocator};
pub use arena::Arena;
pub use block::BlockInfo;
pub use config::{ArenaConfig, GrowthPolicy};
pub use error::ArenaError;
