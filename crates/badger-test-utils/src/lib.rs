//! Test fixtures for Badger development.
//!
//! Provides a [`CleanupLog`] that records the order in which deferred
//! cleanups fire, and a [`LimitedAllocator`] that backs an arena with a
//! fixed byte budget so out-of-memory paths can be exercised.

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod allocator;
pub mod fixtures;

pub use allocator::LimitedAllocator;
pub use fixtures::CleanupLog;
