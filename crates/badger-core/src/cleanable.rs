//! Ordered chains of deferred cleanup actions.
//!
//! A [`Cleanable`] owns a list of closures that run exactly once, oldest
//! first, when the chain is reset or dropped. A chain can hand its whole
//! list to another chain ([`Cleanable::delegate_cleanups_to`]); the
//! receiver runs the delegated entries after its own existing ones.
//!
//! Types that embed a chain expose it through [`AsCleanable`], which is what
//! [`SharedCleanablePtr`](crate::SharedCleanablePtr) and
//! [`PinnableSlice`](crate::PinnableSlice) accept as a target.

use std::fmt;

use smallvec::SmallVec;

/// A single deferred action.
pub type CleanupFn = Box<dyn FnOnce() + Send + 'static>;

/// An ordered, fire-once list of cleanup actions.
///
/// The first entry is stored inline, so a chain holding one cleanup (the
/// common case for pinned slices) does not allocate.
#[derive(Default)]
pub struct Cleanable {
    cleanups: SmallVec<[CleanupFn; 1]>,
}

impl Cleanable {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self {
            cleanups: SmallVec::new(),
        }
    }

    /// Append a cleanup to run when this chain is reset or dropped.
    pub fn register_cleanup<F>(&mut self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cleanups.push(Box::new(f));
    }

    /// Move every pending cleanup to the end of `other`'s chain.
    ///
    /// Nothing fires. Relative order is kept, and the delegated entries
    /// run after whatever `other` already held.
    pub fn delegate_cleanups_to<T: AsCleanable + ?Sized>(&mut self, other: &mut T) {
        let target = other.as_cleanable_mut();
        if target.cleanups.is_empty() {
            std::mem::swap(&mut target.cleanups, &mut self.cleanups);
        } else {
            target.cleanups.extend(self.cleanups.drain(..));
        }
    }

    /// Run every pending cleanup, oldest first, and clear the chain.
    pub fn reset(&mut self) {
        let pending = std::mem::take(&mut self.cleanups);
        for cleanup in pending {
            cleanup();
        }
    }

    /// Whether at least one cleanup is pending.
    pub fn has_cleanups(&self) -> bool {
        !self.cleanups.is_empty()
    }

    /// Number of pending cleanups.
    pub fn len(&self) -> usize {
        self.cleanups.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.cleanups.is_empty()
    }
}

impl Drop for Cleanable {
    fn drop(&mut self) {
        self.reset();
    }
}

impl fmt::Debug for Cleanable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cleanable")
            .field("pending", &self.cleanups.len())
            .finish()
    }
}

/// Access to a cleanup chain embedded in a larger object.
pub trait AsCleanable {
    /// Shared access to the chain.
    fn as_cleanable(&self) -> &Cleanable;

    /// Exclusive access to the chain.
    fn as_cleanable_mut(&mut self) -> &mut Cleanable;
}

impl AsCleanable for Cleanable {
    fn as_cleanable(&self) -> &Cleanable {
        self
    }

    fn as_cleanable_mut(&mut self) -> &mut Cleanable {
        self
    }
}
