//! A small fixed-size thread pool.
//!
//! Workers pull boxed tasks from a shared crossbeam channel. The pool is
//! a standalone utility: nothing in the arena or slice crates depends on
//! it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod error;
pub mod pool;

pub use error::PoolError;
pub use pool::{Executor, Task, ThreadPool};
