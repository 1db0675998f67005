//! Reference-counted, shareable cleanup chains.
//!
//! [`SharedCleanablePtr`] owns one heap-allocated [`Cleanable`] together
//! with an atomic reference count. Every copy (clone, or a copy registered
//! into another chain with [`SharedCleanablePtr::register_copy_with`])
//! holds one reference. The held chain runs exactly once, on whichever
//! thread drops the last reference.
//!
//! Unlike `Arc<Cleanable>`, a handle can fold its reference *into* another
//! cleanup chain, either as a new copy or by moving itself.
//!
//! # Reference cycles
//!
//! A copy registered into the chain it points at keeps itself alive: the
//! count can never reach zero and the cleanups never run. Avoiding such
//! cycles is the caller's responsibility. [`SharedCleanablePtr::get_mut`]
//! refuses access once a handle is shared, which rules out the direct
//! self-registration case.

#![allow(unsafe_code)]

use std::fmt;
use std::ptr::NonNull;
use std::sync::atomic::{self, AtomicUsize, Ordering};

use crate::cleanable::{AsCleanable, Cleanable};

struct Shared {
    refs: AtomicUsize,
    cleanable: Cleanable,
}

/// A copyable, reference-counted handle to a [`Cleanable`].
///
/// The handle starts empty; [`SharedCleanablePtr::allocate`] gives it a
/// fresh chain with a reference count of one.
pub struct SharedCleanablePtr {
    ptr: Option<NonNull<Shared>>,
}

// SAFETY: the held `Cleanable` is only touched through `get_mut` (which
// requires the count to be exactly one, i.e. no other handle exists) and
// by the single thread that observes the count reach zero. Cleanup
// closures are `Send`, so running them on that thread is sound. The count
// itself is atomic.
unsafe impl Send for SharedCleanablePtr {}
// SAFETY: `&SharedCleanablePtr` only permits `clone`, `ref_count` and
// `register_copy_with`, none of which access the chain.
unsafe impl Sync for SharedCleanablePtr {}

impl SharedCleanablePtr {
    /// Create an empty handle.
    pub const fn new() -> Self {
        Self { ptr: None }
    }

    /// Create a handle that already owns a fresh, empty chain.
    pub fn allocated() -> Self {
        let mut handle = Self::new();
        handle.allocate();
        handle
    }

    /// Point this handle at a new, empty chain with a count of one.
    ///
    /// Any previous reference is released first.
    pub fn allocate(&mut self) {
        self.reset();
        let shared = Box::new(Shared {
            refs: AtomicUsize::new(1),
            cleanable: Cleanable::new(),
        });
        self.ptr = Some(NonNull::from(Box::leak(shared)));
    }

    /// Release this handle's reference and leave it empty.
    ///
    /// If this was the last reference the held chain runs now.
    pub fn reset(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            // SAFETY: `ptr` came from `Box::leak` in `allocate` and this
            // handle owned one reference to it.
            unsafe { release(ptr) };
        }
    }

    /// Whether this handle points at nothing.
    pub fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    /// Current number of references, or zero for an empty handle.
    ///
    /// Only a snapshot; other threads may change it concurrently.
    pub fn ref_count(&self) -> usize {
        match self.ptr {
            // SAFETY: this handle holds a reference, so the allocation is live.
            Some(ptr) => unsafe { ptr.as_ref() }.refs.load(Ordering::Relaxed),
            None => 0,
        }
    }

    /// Whether both handles point at the same chain.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }

    /// Exclusive access to the held chain, while this is the only reference.
    ///
    /// Returns `None` for an empty handle or once any copy exists, so a
    /// chain is never mutated after it has been shared.
    pub fn get_mut(&mut self) -> Option<&mut Cleanable> {
        let mut ptr = self.ptr?;
        // SAFETY: this handle holds a reference, so the allocation is live.
        let shared = unsafe { ptr.as_ref() };
        // Acquire pairs with the release decrement in `release`, so any prior
        // owner's use of the chain happens-before ours.
        if shared.refs.load(Ordering::Acquire) != 1 {
            return None;
        }
        // SAFETY: the count is one and we hold `&mut self`, so no other
        // handle or cleanup entry can reach the allocation.
        Some(unsafe { &mut ptr.as_mut().cleanable })
    }

    /// Register a cleanup on the held chain.
    ///
    /// Returns `false`, dropping `f` unrun, if the handle is empty or shared.
    pub fn register_cleanup<F>(&mut self, f: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        match self.get_mut() {
            Some(chain) => {
                chain.register_cleanup(f);
                true
            }
            None => false,
        }
    }

    /// Add a reference owned by a new cleanup entry on `target`.
    ///
    /// The held chain therefore runs only after `target` has run its own
    /// earlier cleanups and every other sharer has released. No-op on an
    /// empty handle.
    pub fn register_copy_with<T: AsCleanable + ?Sized>(&self, target: &mut T) {
        if self.ptr.is_none() {
            return;
        }
        let copy = self.clone();
        target.as_cleanable_mut().register_cleanup(move || drop(copy));
    }

    /// Transfer this handle's reference into a cleanup entry on `target`.
    ///
    /// The count is unchanged and this handle becomes empty. No-op on an
    /// empty handle.
    pub fn move_as_cleanup_to<T: AsCleanable + ?Sized>(&mut self, target: &mut T) {
        if self.ptr.is_none() {
            return;
        }
        let moved = std::mem::take(self);
        target.as_cleanable_mut().register_cleanup(move || drop(moved));
    }
}

/// Drop one reference to `ptr`, destroying the allocation on zero.
///
/// # Safety
///
/// `ptr` must come from `SharedCleanablePtr::allocate` and the caller must
/// own one of its references, which it gives up here.
unsafe fn release(ptr: NonNull<Shared>) {
    // SAFETY: the caller's reference keeps the allocation live until the
    // decrement below.
    let shared = unsafe { ptr.as_ref() };
    if shared.refs.fetch_sub(1, Ordering::Release) != 1 {
        return;
    }
    atomic::fence(Ordering::Acquire);
    // SAFETY: the count reached zero, so no other reference exists and the
    // allocation can be reclaimed. Dropping the box runs the chain.
    drop(unsafe { Box::from_raw(ptr.as_ptr()) });
}

impl Clone for SharedCleanablePtr {
    fn clone(&self) -> Self {
        if let Some(ptr) = self.ptr {
            // SAFETY: this handle holds a reference, so the allocation is live.
            unsafe { ptr.as_ref() }.refs.fetch_add(1, Ordering::Relaxed);
        }
        Self { ptr: self.ptr }
    }
}

impl Default for SharedCleanablePtr {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SharedCleanablePtr {
    fn drop(&mut self) {
        self.reset();
    }
}

impl fmt::Debug for SharedCleanablePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedCleanablePtr")
            .field("refs", &self.ref_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn counted(handle: &mut SharedCleanablePtr) -> Arc<AtomicUsize> {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        assert!(handle.register_cleanup(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        fired
    }

    #[test]
    fn new_handle_is_empty() {
        let handle = SharedCleanablePtr::new();
        assert!(handle.is_empty());
        assert_eq!(handle.ref_count(), 0);
    }

    #[test]
    fn allocate_starts_at_one() {
        let handle = SharedCleanablePtr::allocated();
        assert!(!handle.is_empty());
        assert_eq!(handle.ref_count(), 1);
    }

    #[test]
    fn clones_share_and_fire_once_after_last_reset() {
        let mut handle = SharedCleanablePtr::allocated();
        let fired = counted(&mut handle);

        let mut copies: Vec<_> = (0..4).map(|_| handle.clone()).collect();
        assert_eq!(handle.ref_count(), 5);
        assert!(copies.iter().all(|c| c.ptr_eq(&handle)));

        handle.reset();
        for copy in copies.iter_mut().take(3) {
            copy.reset();
            assert_eq!(fired.load(Ordering::SeqCst), 0);
        }
        assert_eq!(copies[3].ref_count(), 1);
        copies[3].reset();
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        drop(copies);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn get_mut_refuses_shared_handles() {
        let mut handle = SharedCleanablePtr::allocated();
        assert!(handle.get_mut().is_some());
        let copy = handle.clone();
        assert!(handle.get_mut().is_none());
        assert!(!handle.register_cleanup(|| {}));
        drop(copy);
        assert!(handle.get_mut().is_some());
    }

    #[test]
    fn register_copy_with_defers_until_target_cleanup() {
        let mut handle = SharedCleanablePtr::allocated();
        let fired = counted(&mut handle);

        let mut target = Cleanable::new();
        handle.register_copy_with(&mut target);
        assert_eq!(handle.ref_count(), 2);

        handle.reset();
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        target.reset();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn shared_cleanups_run_after_target_existing_cleanups() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut handle = SharedCleanablePtr::allocated();
        let log = Arc::clone(&order);
        handle.register_cleanup(move || log.lock().unwrap().push("shared"));

        let mut target = Cleanable::new();
        let log = Arc::clone(&order);
        target.register_cleanup(move || log.lock().unwrap().push("target"));

        handle.move_as_cleanup_to(&mut target);
        assert!(handle.is_empty());
        drop(target);
        assert_eq!(*order.lock().unwrap(), vec!["target", "shared"]);
    }

    #[test]
    fn move_as_cleanup_keeps_count() {
        let mut handle = SharedCleanablePtr::allocated();
        let fired = counted(&mut handle);
        let observer = handle.clone();

        let mut target = Cleanable::new();
        handle.move_as_cleanup_to(&mut target);
        assert!(handle.is_empty());
        assert_eq!(observer.ref_count(), 2);

        target.reset();
        assert_eq!(observer.ref_count(), 1);
        drop(observer);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_handle_operations_are_no_ops() {
        let mut handle = SharedCleanablePtr::new();
        let mut target = Cleanable::new();
        handle.register_copy_with(&mut target);
        handle.move_as_cleanup_to(&mut target);
        assert!(!target.has_cleanups());
        handle.reset();
        assert!(handle.get_mut().is_none());
    }

    #[test]
    fn allocate_releases_previous_chain() {
        let mut handle = SharedCleanablePtr::allocated();
        let fired = counted(&mut handle);
        handle.allocate();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(handle.ref_count(), 1);
    }

    #[test]
    fn concurrent_release_fires_exactly_once() {
        let mut handle = SharedCleanablePtr::allocated();
        let fired = counted(&mut handle);

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let copy = handle.clone();
                std::thread::spawn(move || {
                    let inner: Vec<_> = (0..100).map(|_| copy.clone()).collect();
                    drop(inner);
                    drop(copy);
                })
            })
            .collect();
        handle.reset();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
