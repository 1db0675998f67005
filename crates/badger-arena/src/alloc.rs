//! Backing allocators that supply arena blocks.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::ptr::NonNull;

/// Source of the blocks an [`Arena`](crate::Arena) bump-allocates from.
///
/// The arena asks for one block at a time, never with a zero-sized
/// layout, and hands every block back through [`deallocate`] with the
/// same layout when it is dropped.
///
/// # Safety
///
/// Implementors must return either `None` or a pointer to at least
/// `usable_size(layout)` bytes aligned to `layout.align()`, exclusively
/// owned by the caller until passed back to `deallocate`.
///
/// [`deallocate`]: BlockAllocator::deallocate
pub unsafe trait BlockAllocator {
    /// Acquire a block for `layout`, or `None` if memory is exhausted.
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Return a block previously obtained from [`allocate`](Self::allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must come from `self.allocate(layout)` with this exact
    /// `layout` and must not have been deallocated already.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Bytes actually usable in a block allocated for `layout`.
    ///
    /// Must be at least `layout.size()`.
    fn usable_size(&self, layout: Layout) -> usize {
        layout.size()
    }
}

/// The process-wide global allocator.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemAllocator;

// SAFETY: defers to `std::alloc`, which upholds the trait contract for
// non-zero layouts; the arena never requests a zero-sized block.
unsafe impl BlockAllocator for SystemAllocator {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        if layout.size() == 0 {
            return None;
        }
        // SAFETY: layout has non-zero size.
        NonNull::new(unsafe { std::alloc::alloc(layout) })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: caller guarantees `ptr` came from `allocate(layout)`.
        unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

// SAFETY: forwards every call to the referenced allocator.
unsafe impl<A: BlockAllocator + ?Sized> BlockAllocator for &A {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        (**self).allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: same contract as the referenced allocator.
        unsafe { (**self).deallocate(ptr, layout) }
    }

    fn usable_size(&self, layout: Layout) -> usize {
        (**self).usable_size(layout)
    }
}
