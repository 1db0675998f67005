//! Byte-budgeted backing allocator.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

use badger_arena::{BlockAllocator, SystemAllocator};

/// A [`BlockAllocator`] that refuses blocks once `budget` bytes are live.
///
/// Pass it by reference (`Arena::with_config_in(config, &limited)`) to
/// inspect the counters while the arena is alive.
#[derive(Debug)]
pub struct LimitedAllocator {
    budget: usize,
    used: AtomicUsize,
    live_blocks: AtomicUsize,
    refusals: AtomicUsize,
}

impl LimitedAllocator {
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            used: AtomicUsize::new(0),
            live_blocks: AtomicUsize::new(0),
            refusals: AtomicUsize::new(0),
        }
    }

    /// An allocator that never refuses on budget grounds.
    pub fn unlimited() -> Self {
        Self::new(usize::MAX)
    }

    /// Bytes currently handed out.
    pub fn used(&self) -> usize {
        self.used.load(Ordering::SeqCst)
    }

    /// Blocks handed out and not yet returned.
    pub fn live_blocks(&self) -> usize {
        self.live_blocks.load(Ordering::SeqCst)
    }

    /// Requests refused because of the budget.
    pub fn refusals(&self) -> usize {
        self.refusals.load(Ordering::SeqCst)
    }
}

// SAFETY: every block comes from `SystemAllocator` with the caller's layout
// and is returned to it unchanged.
unsafe impl BlockAllocator for LimitedAllocator {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        let reserved = self
            .used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                used.checked_add(layout.size()).filter(|&n| n <= self.budget)
            });
        if reserved.is_err() {
            self.refusals.fetch_add(1, Ordering::SeqCst);
            return None;
        }
        match SystemAllocator.allocate(layout) {
            Some(ptr) => {
                self.live_blocks.fetch_add(1, Ordering::SeqCst);
                Some(ptr)
            }
            None => {
                self.used.fetch_sub(layout.size(), Ordering::SeqCst);
                None
            }
        }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded unchanged from the caller's contract.
        unsafe { SystemAllocator.deallocate(ptr, layout) };
        self.used.fetch_sub(layout.size(), Ordering::SeqCst);
        self.live_blocks.fetch_sub(1, Ordering::SeqCst);
    }
}
